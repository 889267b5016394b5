//! DataIndex building logic.
//!
//! Builds the lookup tables from parsed rows:
//! - movie id -> catalog position
//! - title -> first catalog position carrying that title
//! - user id -> that user's ratings

use crate::cache::DatasetCache;
use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

impl DataIndex {
    /// Load the catalog and rating history through the process-wide cache.
    ///
    /// The two files are parsed in parallel with Rayon. A second call with
    /// the same paths reuses the cached rows and only rebuilds the lookups.
    pub fn load_from_files(movies_path: &Path, ratings_path: &Path) -> Result<Self> {
        Self::load_with_cache(DatasetCache::global(), movies_path, ratings_path)
    }

    /// Same as [`DataIndex::load_from_files`] with an explicit cache
    pub fn load_with_cache(
        cache: &DatasetCache,
        movies_path: &Path,
        ratings_path: &Path,
    ) -> Result<Self> {
        info!(
            "Loading catalog from {} and ratings from {}",
            movies_path.display(),
            ratings_path.display()
        );

        let (movies, ratings) = rayon::join(
            || cache.load_movies(movies_path),
            || cache.load_ratings(ratings_path),
        );
        let index = Self::from_parts(movies?, &ratings?)?;

        let (users, movies, ratings) = index.counts();
        info!("Loaded {} movies, {} ratings from {} users", movies, ratings, users);
        Ok(index)
    }

    /// Build the index from already-parsed rows.
    ///
    /// Fails if the catalog repeats a movie id. Ratings for ids missing from
    /// the catalog are kept: they still mark the movie as rated.
    pub fn from_parts(movies: Arc<[Movie]>, ratings: &[Rating]) -> Result<Self> {
        let mut movie_positions = HashMap::with_capacity(movies.len());
        let mut title_positions = HashMap::with_capacity(movies.len());

        for (pos, movie) in movies.iter().enumerate() {
            if movie_positions.insert(movie.id, pos).is_some() {
                return Err(DataLoadError::DuplicateMovie { id: movie.id });
            }
            // First row wins for duplicate titles
            title_positions.entry(movie.title.clone()).or_insert(pos);
        }

        let mut user_ratings: HashMap<UserId, Vec<Rating>> = HashMap::new();
        for rating in ratings {
            user_ratings
                .entry(rating.user_id)
                .or_insert_with(Vec::new)
                .push(*rating);
        }

        Ok(Self {
            movies,
            movie_positions,
            title_positions,
            user_ratings,
            rating_count: ratings.len(),
        })
    }
}
