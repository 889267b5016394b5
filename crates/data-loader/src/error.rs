//! Error types for the data-loader crate.
//!
//! Every failure carries enough context (file, line, id) to be shown to the
//! user as-is. Callers treat all of these as fatal to recommendations for
//! the session, but never as a reason to crash.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the movie catalog or rating history
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("Data file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// I/O error occurred while reading file
    #[error("I/O error reading {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row in a data file couldn't be parsed
    ///
    /// `line` is 1-based and counts the header row, so it matches what an
    /// editor shows.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A required column is missing from the header row
    #[error("Missing column `{column}` in {file}")]
    MissingColumn { file: String, column: &'static str },

    /// The catalog lists the same movie id twice
    #[error("Duplicate movieId {id} in movie catalog")]
    DuplicateMovie { id: u32 },
}

impl DataLoadError {
    /// Classify an `io::Error` raised while opening `path`
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DataLoadError::IoError {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
