//! # Application Context
//!
//! Everything a recommendation request reads, loaded once at startup:
//! 1. The catalog and rating history (through the dataset cache)
//! 2. The pre-trained predictor
//!
//! Both are immutable afterwards and shared behind `Arc`, so the context is
//! cheap to clone into a blocking task.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use data_loader::{DataIndex, DataLoadError};
use predictor::{load_predictor, ModelLoadError, Predictor};
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

/// Failures that leave the session without recommendations
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load dataset: {0}")]
    Data(#[from] DataLoadError),

    #[error("Failed to load pre-trained model: {0}")]
    Model(#[from] ModelLoadError),

    #[error("Loader task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Loaded tables and model, passed explicitly to every request
#[derive(Clone)]
pub struct AppContext {
    data: Arc<DataIndex>,
    predictor: Arc<dyn Predictor>,
}

impl AppContext {
    pub fn new(data: Arc<DataIndex>, predictor: Arc<dyn Predictor>) -> Self {
        Self { data, predictor }
    }

    /// Load the dataset and the model concurrently.
    ///
    /// A dataset error is reported ahead of a model error when both fail.
    pub async fn load(config: &AppConfig) -> Result<Self, StartupError> {
        let start_time = Instant::now();

        let (data_result, model_result) = tokio::join!(
            tokio::task::spawn_blocking({
                let movies_path = config.movies_path.clone();
                let ratings_path = config.ratings_path.clone();
                move || DataIndex::load_from_files(&movies_path, &ratings_path)
            }),
            tokio::task::spawn_blocking({
                let model_path = config.model_path.clone();
                move || load_predictor(&model_path)
            })
        );

        let data = data_result??;
        let model = model_result??;
        info!("Application context ready in {:.2?}", start_time.elapsed());

        Ok(Self::new(Arc::new(data), Arc::new(model)))
    }

    pub fn data(&self) -> &DataIndex {
        &self.data
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (users, movies, ratings) = self.data.counts();
        f.debug_struct("AppContext")
            .field("users", &users)
            .field("movies", &movies)
            .field("ratings", &ratings)
            .field("predictor", &self.predictor.name())
            .finish()
    }
}
