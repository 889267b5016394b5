//! Where the session loads its inputs from, and how requests are run.

use recommender::RecommendOptions;
use std::path::PathBuf;

pub const DEFAULT_MOVIES_PATH: &str = "movie.csv";
pub const DEFAULT_RATINGS_PATH: &str = "rating.csv";
pub const DEFAULT_MODEL_PATH: &str = "svd_model.pb";

/// Startup configuration; `Default` gives the fixed relative paths
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub movies_path: PathBuf,
    pub ratings_path: PathBuf,
    pub model_path: PathBuf,
    pub options: RecommendOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            movies_path: PathBuf::from(DEFAULT_MOVIES_PATH),
            ratings_path: PathBuf::from(DEFAULT_RATINGS_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            options: RecommendOptions::default(),
        }
    }
}
