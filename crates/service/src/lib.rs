//! Service crate for the ReelRecs top-N recommender.
//!
//! This crate wires the loaded dataset and model into an application
//! context and exposes the session that the front-end drives.

pub mod config;
pub mod context;
pub mod session;

pub use config::{AppConfig, DEFAULT_MODEL_PATH, DEFAULT_MOVIES_PATH, DEFAULT_RATINGS_PATH};
pub use context::{AppContext, StartupError};
pub use session::{Outcome, Session, SessionError, Warning};
