//! Rating predictors for the recommender.
//!
//! This crate provides:
//! - The [`Predictor`] capability: one estimated rating per (user, movie) pair
//! - [`SvdModel`], a pre-trained biased matrix-factorization model
//! - Loading that model from its binary artifact with [`load_predictor`]
//!
//! The recommender never looks inside a predictor; anything implementing
//! the trait can be swapped in, including the [`ConstantPredictor`] stub.

use data_loader::{MovieId, UserId};
use std::path::PathBuf;
use thiserror::Error;

pub mod artifact;
pub mod svd;

pub use artifact::{load_predictor, FactorRow, SvdModelProto};
pub use svd::{LatentFactors, SvdModel};

/// Errors raised while loading a model artifact
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact is corrupt: {0}")]
    Corrupt(#[from] prost::DecodeError),

    /// The artifact decoded but cannot serve estimates
    #[error("Model artifact is invalid: {0}")]
    Invalid(String),
}

/// Errors raised by a single `estimate` call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Prediction failed for user {user_id}, movie {movie_id}: {reason}")]
    Failed {
        user_id: UserId,
        movie_id: MovieId,
        reason: String,
    },

    #[error("Predictor returned a non-finite estimate ({value}) for user {user_id}, movie {movie_id}")]
    NonFinite {
        user_id: UserId,
        movie_id: MovieId,
        value: f32,
    },
}

/// Something that can estimate how a user would rate a movie.
///
/// `Send + Sync` lets one loaded model be shared read-only across the
/// whole session behind an `Arc`.
pub trait Predictor: Send + Sync {
    /// Returns the name of this predictor (for logging)
    fn name(&self) -> &str;

    /// Estimated rating of `movie_id` by `user_id`
    fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<f32, PredictionError>;
}

/// Predicts the same rating for every pair
#[derive(Debug, Clone, Copy)]
pub struct ConstantPredictor(pub f32);

impl Predictor for ConstantPredictor {
    fn name(&self) -> &str {
        "ConstantPredictor"
    }

    fn estimate(&self, _user_id: UserId, _movie_id: MovieId) -> Result<f32, PredictionError> {
        Ok(self.0)
    }
}
