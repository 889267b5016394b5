//! Input validation and top-N ranking for movie recommendations.
//!
//! This crate provides:
//! - Validation helpers for the user id and the movie selection
//! - Candidate generation (catalog minus what the user already rated)
//! - The recommendation engine that scores and ranks candidates
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{recommend, user_exists, RecommendOptions};
//!
//! if !user_exists(user_id, &data) {
//!     tracing::warn!("User {} has no ratings; recommending cold", user_id);
//! }
//! let top = recommend(user_id, &data, &model, &RecommendOptions::default())?;
//! ```

pub mod candidates;
pub mod engine;
pub mod validate;

// Re-export main types
pub use engine::{
    recommend, FailurePolicy, Recommendation, RecommendError, RecommendOptions, DEFAULT_TOP_N,
};
pub use validate::{resolve_movie, search_titles, user_exists};
