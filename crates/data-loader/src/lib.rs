//! # Data Loader Crate
//!
//! This crate loads the movie catalog and rating history CSV files and
//! indexes them for the recommender.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **parser**: Parse CSV files into Rust structs
//! - **cache**: Process-wide, load-once cache of parsed files
//! - **index**: Build the lookups used by validation and ranking
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("movie.csv"), Path::new("rating.csv"))?;
//!
//! let movie = index.get_movie_by_title("Toy Story (1995)").unwrap();
//! let ratings = index.get_user_ratings(1);
//! println!("User 1 rated {} movies; picked {}", ratings.len(), movie.title);
//! ```

// Public modules
pub mod cache;
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use cache::DatasetCache;
pub use error::{DataLoadError, Result};
pub use types::{DataIndex, Movie, MovieId, Rating, UserId};
