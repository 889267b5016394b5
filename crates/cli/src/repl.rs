//! Interactive prompt loop.
//!
//! Mirrors the one-page flow: enter a user id, search and select a movie,
//! then trigger recommendations. Every request finishes before the next
//! line is read.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use data_loader::UserId;
use service::{Outcome, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::Console;

const SEARCH_LIMIT: usize = 20;

const HELP: &str = "\
Commands:
  user <id>           set your user ID (positive integer)
  search <text>       find movies by title
  select <title|#n>   pick a movie by exact title or search result number
  recommend           show your top recommendations
  help                show this message
  quit                leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Title(String),
    /// 1-based index into the last search results
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    User(UserId),
    Search(String),
    Select(Selection),
    Recommend,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "user" => match rest.parse::<UserId>() {
                Ok(id) if id > 0 => Ok(ReplCommand::User(id)),
                _ => Err("User ID must be a positive integer".to_string()),
            },
            "search" if !rest.is_empty() => Ok(ReplCommand::Search(rest.to_string())),
            "search" => Err("Usage: search <text>".to_string()),
            "select" => parse_selection(rest).map(ReplCommand::Select),
            "recommend" | "rec" => Ok(ReplCommand::Recommend),
            "help" | "?" => Ok(ReplCommand::Help),
            "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command '{}'; type 'help'", other)),
        }
    }
}

fn parse_selection(rest: &str) -> Result<Selection, String> {
    if rest.is_empty() {
        return Err("Usage: select <title|#n>".to_string());
    }
    match rest.strip_prefix('#') {
        Some(n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Selection::Index(n)),
            _ => Err(format!("'{}' is not a search result number", rest)),
        },
        None => Ok(Selection::Title(rest.to_string())),
    }
}

/// Run the prompt loop until `quit` or end of input
pub async fn run<O: Write, E: Write>(
    console: &mut Console<O, E>,
    session: &mut Session,
) -> Result<()> {
    console.line(HELP)?;
    let mut last_results: Vec<String> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        console.prompt("> ")?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match line.parse::<ReplCommand>() {
            Ok(command) => command,
            Err(message) if message.is_empty() => continue,
            Err(message) => {
                console.error(&message)?;
                continue;
            }
        };

        match command {
            ReplCommand::User(id) => match session.set_user(id) {
                Ok(Some(warning)) => console.user_warning(&warning)?,
                Ok(None) => console.success(&format!("User ID set to {}", id))?,
                Err(e) => console.error(&e.to_string())?,
            },
            ReplCommand::Search(query) => match session.search(&query, SEARCH_LIMIT) {
                Ok(movies) => {
                    console.search_results(&query, &movies)?;
                    last_results = movies.iter().map(|m| m.title.clone()).collect();
                }
                Err(e) => console.error(&e.to_string())?,
            },
            ReplCommand::Select(selection) => {
                let title = match selection {
                    Selection::Title(title) => title,
                    Selection::Index(n) => match last_results.get(n - 1) {
                        Some(title) => title.clone(),
                        None => {
                            console.error(&format!("No search result #{}", n))?;
                            continue;
                        }
                    },
                };
                match session.select_movie(&title) {
                    Ok(movie) => console.success(&format!("Selected {}", movie.title))?,
                    Err(e) => console.error(&e.to_string())?,
                }
            }
            ReplCommand::Recommend => {
                if let Some(id) = session.user_id() {
                    console.line(&format!("Generating recommendations for user {}...", id))?;
                }
                match session.recommend().await {
                    Ok(Outcome::Ranked(recs)) => console.recommendations(&recs)?,
                    Ok(outcome @ Outcome::Empty) => {
                        if let Some(warning) = outcome.warning() {
                            console.user_warning(&warning)?;
                        }
                    }
                    Err(e) => console.error(&e.to_string())?,
                }
            }
            ReplCommand::Help => console.line(HELP)?,
            ReplCommand::Quit => break,
        }
    }
    Ok(())
}
