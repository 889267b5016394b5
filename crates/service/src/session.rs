//! Interactive session state.
//!
//! A session is either ready (data and model loaded) or disabled (a load
//! failed). A disabled session refuses every control with the load error,
//! so nothing downstream ever runs without a model.
//!
//! Within a ready session the user enters an id, picks a movie and triggers
//! a request. Unknown ids only warn; prediction failures fail that one
//! request and leave the session usable.

use std::fmt;

use data_loader::{Movie, MovieId, UserId};
use recommender::{
    recommend, resolve_movie, search_titles, user_exists, Recommendation, RecommendError,
    RecommendOptions,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::context::AppContext;

/// Non-fatal conditions shown inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UserNotFound(UserId),
    NoRecommendations,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UserNotFound(id) => write!(
                f,
                "User ID {id} not found in the database. Please try a different User ID."
            ),
            Warning::NoRecommendations => write!(f, "No related movies found."),
        }
    }
}

/// Result of a successful request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ranked(Vec<Recommendation>),
    /// Nothing left to score for this user
    Empty,
}

impl Outcome {
    pub fn warning(&self) -> Option<Warning> {
        match self {
            Outcome::Ranked(_) => None,
            Outcome::Empty => Some(Warning::NoRecommendations),
        }
    }
}

/// Errors returned by session controls
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Recommendations are unavailable: {0}")]
    Disabled(String),

    #[error("User ID must be a positive integer")]
    InvalidUserId,

    #[error("Enter a user ID first")]
    NoUser,

    #[error("Select a movie first")]
    NoSelection,

    #[error("Movie not found in catalog: {0}")]
    MovieNotFound(String),

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("Recommendation task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
enum State {
    Ready(AppContext),
    Disabled(String),
}

/// One user's interaction with the recommender
#[derive(Debug)]
pub struct Session {
    state: State,
    options: RecommendOptions,
    user_id: Option<UserId>,
    selected: Option<MovieId>,
}

impl Session {
    /// Load everything the session needs.
    ///
    /// Never fails: a load error produces a disabled session that reports
    /// the error on every control.
    pub async fn start(config: &AppConfig) -> Self {
        match AppContext::load(config).await {
            Ok(context) => {
                info!("Session ready: {:?}", context);
                Self::ready(context, config.options.clone())
            }
            Err(e) => {
                error!("Recommendations disabled: {}", e);
                Self::disabled(e.to_string())
            }
        }
    }

    pub fn ready(context: AppContext, options: RecommendOptions) -> Self {
        Self {
            state: State::Ready(context),
            options,
            user_id: None,
            selected: None,
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            state: State::Disabled(reason.into()),
            options: RecommendOptions::default(),
            user_id: None,
            selected: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Why the session is disabled, if it is
    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.state {
            State::Ready(_) => None,
            State::Disabled(reason) => Some(reason),
        }
    }

    pub fn context(&self) -> Result<&AppContext, SessionError> {
        match &self.state {
            State::Ready(context) => Ok(context),
            State::Disabled(reason) => Err(SessionError::Disabled(reason.clone())),
        }
    }

    pub fn options(&self) -> &RecommendOptions {
        &self.options
    }

    /// Set the requesting user; warns (but accepts) ids with no ratings
    pub fn set_user(&mut self, user_id: UserId) -> Result<Option<Warning>, SessionError> {
        let context = self.context()?;
        if user_id == 0 {
            return Err(SessionError::InvalidUserId);
        }

        let warning = if user_exists(user_id, context.data()) {
            None
        } else {
            warn!("User {} has no ratings", user_id);
            Some(Warning::UserNotFound(user_id))
        };
        self.user_id = Some(user_id);
        Ok(warning)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Titles matching `query`, for picking a movie
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<&Movie>, SessionError> {
        let context = self.context()?;
        Ok(search_titles(query, context.data(), limit))
    }

    /// Select a movie by exact title
    pub fn select_movie(&mut self, title: &str) -> Result<&Movie, SessionError> {
        let context = match &self.state {
            State::Ready(context) => context,
            State::Disabled(reason) => return Err(SessionError::Disabled(reason.clone())),
        };
        let movie = resolve_movie(title, context.data())
            .ok_or_else(|| SessionError::MovieNotFound(title.to_string()))?;
        self.selected = Some(movie.id);
        Ok(movie)
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        let context = self.context().ok()?;
        context.data().get_movie(self.selected?)
    }

    /// Run one recommendation request for the current user.
    ///
    /// Scoring runs on a blocking thread; the caller awaits it before
    /// handling further input.
    pub async fn recommend(&self) -> Result<Outcome, SessionError> {
        let context = self.context()?.clone();
        let user_id = self.user_id.ok_or(SessionError::NoUser)?;
        let selected = self.selected_movie().ok_or(SessionError::NoSelection)?;
        info!(
            "Recommending for user {} (selected: {})",
            user_id, selected.title
        );

        let options = self.options.clone();
        let recommendations = tokio::task::spawn_blocking(move || {
            recommend(user_id, context.data(), context.predictor(), &options)
        })
        .await??;

        if recommendations.is_empty() {
            Ok(Outcome::Empty)
        } else {
            Ok(Outcome::Ranked(recommendations))
        }
    }
}
