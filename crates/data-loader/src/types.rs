//! Core domain types for the movie catalog and rating history.
//!
//! Both tables are loaded once and never mutated afterwards, so the
//! `DataIndex` only exposes read accessors once it has been built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie & Rating
// =============================================================================

/// A row of the movie catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Pipe-separated genre string as stored in the catalog, e.g.
    /// `"Adventure|Animation|Children"`.
    ///
    /// `None` when the catalog has no genres column or the cell is empty.
    pub genres: Option<String>,
}

impl Movie {
    /// Genres split on `|`, empty when the movie has none
    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .as_deref()
            .map(|g| g.split('|').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// A single rating from a user for a movie
///
/// Only the columns the recommender needs are kept; anything else in the
/// source row (timestamps etc.) is dropped at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
}

// =============================================================================
// DataIndex - The In-Memory Tables
// =============================================================================

/// Catalog and rating history with the lookups the recommender needs.
///
/// The catalog keeps its load order: candidate generation iterates it in
/// that order, and title lookup resolves duplicates to the first row.
#[derive(Debug, Clone)]
pub struct DataIndex {
    /// Catalog rows in load order
    pub(crate) movies: Arc<[Movie]>,
    /// movie id -> position in `movies`
    pub(crate) movie_positions: HashMap<MovieId, usize>,
    /// title -> position of the first row carrying that title
    pub(crate) title_positions: HashMap<String, usize>,
    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    pub(crate) rating_count: usize,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: Arc::from(Vec::new()),
            movie_positions: HashMap::new(),
            title_positions: HashMap::new(),
            user_ratings: HashMap::new(),
            rating_count: 0,
        }
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movie_positions.get(&id).map(|&pos| &self.movies[pos])
    }

    /// First movie in load order whose title is exactly `title`
    pub fn get_movie_by_title(&self, title: &str) -> Option<&Movie> {
        self.title_positions.get(title).map(|&pos| &self.movies[pos])
    }

    /// The whole catalog in load order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the user has at least one rating row
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.user_ratings.len(), self.movies.len(), self.rating_count)
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
