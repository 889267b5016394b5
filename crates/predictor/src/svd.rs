//! Biased SVD (matrix factorization) rating model.
//!
//! A trained model stores a global mean plus a bias and a latent factor
//! vector for every user and item seen in training. The estimate for a
//! pair is
//!
//! ```text
//! r = mu + b_u + b_i + q_i . p_u
//! ```
//!
//! where unknown users contribute neither `b_u` nor `p_u`, unknown items
//! neither `b_i` nor `q_i`, and the result is clipped to the rating scale
//! the model was trained on.

use crate::{ModelLoadError, PredictionError, Predictor};
use data_loader::{MovieId, UserId};
use std::collections::HashMap;
use tracing::trace;

/// Bias and latent vector for one user or item
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactors {
    pub bias: f32,
    pub factors: Vec<f32>,
}

impl LatentFactors {
    pub fn new(bias: f32, factors: Vec<f32>) -> Self {
        Self { bias, factors }
    }

    fn dot(&self, other: &LatentFactors) -> f32 {
        self.factors
            .iter()
            .zip(&other.factors)
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Pre-trained biased SVD model
#[derive(Debug, Clone)]
pub struct SvdModel {
    global_mean: f32,
    rating_min: f32,
    rating_max: f32,
    n_factors: usize,
    pub(crate) users: HashMap<UserId, LatentFactors>,
    pub(crate) items: HashMap<MovieId, LatentFactors>,
}

impl SvdModel {
    /// Empty model with the given global mean and rating scale
    pub fn new(
        global_mean: f32,
        rating_min: f32,
        rating_max: f32,
        n_factors: usize,
    ) -> Result<Self, ModelLoadError> {
        if !global_mean.is_finite() {
            return Err(ModelLoadError::Invalid(format!(
                "global mean is not finite ({global_mean})"
            )));
        }
        if !(rating_min.is_finite() && rating_max.is_finite() && rating_min < rating_max) {
            return Err(ModelLoadError::Invalid(format!(
                "rating scale [{rating_min}, {rating_max}] is not a valid range"
            )));
        }
        Ok(Self {
            global_mean,
            rating_min,
            rating_max,
            n_factors,
            users: HashMap::new(),
            items: HashMap::new(),
        })
    }

    /// Add a trained user row
    pub fn insert_user(&mut self, id: UserId, row: LatentFactors) -> Result<(), ModelLoadError> {
        self.check_row("user", id, &row)?;
        self.users.insert(id, row);
        Ok(())
    }

    /// Add a trained item row
    pub fn insert_item(&mut self, id: MovieId, row: LatentFactors) -> Result<(), ModelLoadError> {
        self.check_row("item", id, &row)?;
        self.items.insert(id, row);
        Ok(())
    }

    fn check_row(&self, kind: &str, id: u32, row: &LatentFactors) -> Result<(), ModelLoadError> {
        if row.factors.len() != self.n_factors {
            return Err(ModelLoadError::Invalid(format!(
                "{kind} {id} has {} factors, expected {}",
                row.factors.len(),
                self.n_factors
            )));
        }
        if !row.bias.is_finite() || row.factors.iter().any(|f| !f.is_finite()) {
            return Err(ModelLoadError::Invalid(format!(
                "{kind} {id} has non-finite parameters"
            )));
        }
        Ok(())
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn rating_scale(&self) -> (f32, f32) {
        (self.rating_min, self.rating_max)
    }

    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    /// Number of users and items the model was trained on
    pub fn counts(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }

    pub fn knows_user(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    pub fn knows_item(&self, id: MovieId) -> bool {
        self.items.contains_key(&id)
    }
}

impl Predictor for SvdModel {
    fn name(&self) -> &str {
        "SVD"
    }

    fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<f32, PredictionError> {
        let user = self.users.get(&user_id);
        let item = self.items.get(&movie_id);

        let mut estimate = self.global_mean;
        if let Some(user) = user {
            estimate += user.bias;
        }
        if let Some(item) = item {
            estimate += item.bias;
        }
        if let (Some(user), Some(item)) = (user, item) {
            estimate += user.dot(item);
        }

        if !estimate.is_finite() {
            return Err(PredictionError::NonFinite {
                user_id,
                movie_id,
                value: estimate,
            });
        }

        trace!(user_id, movie_id, estimate, "raw SVD estimate");
        Ok(estimate.clamp(self.rating_min, self.rating_max))
    }
}
