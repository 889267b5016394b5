//! Parser for the catalog and rating CSV files.
//!
//! Expected layouts (header row required, extra columns ignored):
//! - movie.csv: movieId,title[,genres]
//! - rating.csv: userId,movieId,rating[,timestamp,...]

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const MOVIE_COLUMNS: &[&str] = &["movieId", "title"];
const RATING_COLUMNS: &[&str] = &["userId", "movieId", "rating"];

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    #[serde(default)]
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
}

/// Parse the movie catalog at `path`, preserving row order
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = open(path)?;
    let movies = movies_from_reader(file, &file_label(path))?;
    debug!("Parsed {} movies from {}", movies.len(), path.display());
    Ok(movies)
}

/// Parse the rating history at `path`
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = open(path)?;
    let ratings = ratings_from_reader(file, &file_label(path))?;
    debug!("Parsed {} ratings from {}", ratings.len(), path.display());
    Ok(ratings)
}

/// Parse a movie catalog from any reader; `label` names the source in errors
pub fn movies_from_reader<R: Read>(reader: R, label: &str) -> Result<Vec<Movie>> {
    let mut csv_reader = csv_reader(reader);
    check_columns(&mut csv_reader, label, MOVIE_COLUMNS)?;

    let mut movies = Vec::new();
    for record in csv_reader.deserialize::<MovieRecord>() {
        let record = record.map_err(|e| map_csv_error(label, e))?;
        movies.push(Movie {
            id: record.movie_id,
            title: record.title,
            genres: record.genres.filter(|g| !g.trim().is_empty()),
        });
    }
    Ok(movies)
}

/// Parse a rating history from any reader; `label` names the source in errors
pub fn ratings_from_reader<R: Read>(reader: R, label: &str) -> Result<Vec<Rating>> {
    let mut csv_reader = csv_reader(reader);
    check_columns(&mut csv_reader, label, RATING_COLUMNS)?;

    let mut ratings = Vec::new();
    for record in csv_reader.deserialize::<RatingRecord>() {
        let record = record.map_err(|e| map_csv_error(label, e))?;
        ratings.push(Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
        });
    }
    Ok(ratings)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| DataLoadError::from_io(path, e))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Fail early with a clear message when a required column is absent
fn check_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    label: &str,
    required: &[&'static str],
) -> Result<()> {
    let headers = reader.headers().map_err(|e| map_csv_error(label, e))?;
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(DataLoadError::MissingColumn {
                file: label.to_string(),
                column,
            });
        }
    }
    Ok(())
}

fn map_csv_error(label: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let reason = match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => err.to_string(),
    };
    match err.into_kind() {
        csv::ErrorKind::Io(source) => DataLoadError::IoError {
            path: label.into(),
            source,
        },
        _ => DataLoadError::ParseError {
            file: label.to_string(),
            line,
            reason,
        },
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
