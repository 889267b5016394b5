//! Terminal rendering for results, warnings and errors.
//!
//! Results go to `out`. Errors always go to `err`. In JSON mode the
//! status lines and warnings go to `err` as well, so `out` carries nothing
//! but the JSON document.

use std::io::{self, Stderr, Stdout, Write};

use colored::Colorize;
use data_loader::Movie;
use recommender::Recommendation;
use service::Warning;

/// Shown when a movie has no genre information
pub const GENRE_PLACEHOLDER: &str = "N/A";

pub fn genre_label(genres: Option<&str>) -> &str {
    genres.unwrap_or(GENRE_PLACEHOLDER)
}

/// Predicted ratings are always shown with two decimals
pub fn rating_label(rating: f32) -> String {
    format!("{:.2}", rating)
}

pub struct Console<O: Write = Stdout, E: Write = Stderr> {
    out: O,
    err: E,
    json: bool,
}

impl Console {
    pub fn stdio(json: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), json)
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub fn new(out: O, err: E, json: bool) -> Self {
        Self { out, err, json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Where human-readable status text goes
    fn status(&mut self) -> &mut dyn Write {
        if self.json {
            &mut self.err as &mut dyn Write
        } else {
            &mut self.out
        }
    }

    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.status(), "{}", message)
    }

    /// Text without a newline, flushed so it shows before input is read
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        let status = self.status();
        write!(status, "{}", text)?;
        status.flush()
    }

    pub fn recommendations(&mut self, recommendations: &[Recommendation]) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format!("Top {} Recommended Movies for You:", recommendations.len())
                .bold()
                .green()
        )?;
        for (i, rec) in recommendations.iter().enumerate() {
            writeln!(
                self.out,
                "{}. 🎥 {} (Rating: {})",
                (i + 1).to_string().green(),
                rec.title.bold(),
                rating_label(rec.predicted_rating)
            )?;
            writeln!(self.out, "   Genre: {}", genre_label(rec.genres.as_deref()))?;
        }
        Ok(())
    }

    /// The ranked list as a pretty-printed JSON array
    pub fn recommendations_json(&mut self, recommendations: &[Recommendation]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, recommendations)?;
        writeln!(self.out)
    }

    pub fn search_results(&mut self, query: &str, movies: &[&Movie]) -> io::Result<()> {
        if movies.is_empty() {
            return self.warning(&format!("No titles match '{}'", query));
        }
        writeln!(
            self.out,
            "{}",
            format!("Search results for '{}':", query).bold().blue()
        )?;
        for (i, movie) in movies.iter().enumerate() {
            let genres = movie.genre_list();
            let genres = if genres.is_empty() {
                GENRE_PLACEHOLDER.to_string()
            } else {
                genres.join(", ")
            };
            writeln!(self.out, "  #{} {} [{}] (id {})", i + 1, movie.title, genres, movie.id)?;
        }
        Ok(())
    }

    pub fn user_warning(&mut self, warning: &Warning) -> io::Result<()> {
        self.warning(&warning.to_string())
    }

    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.status(), "{} {}", "⚠".yellow(), message.yellow())
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "{} {}", "✗".red(), message.red())
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.status(), "{} {}", "✓".green(), message)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
