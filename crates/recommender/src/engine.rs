//! # Recommendation Engine
//!
//! Scores every unrated catalog movie for one user and keeps the best N:
//! 1. Collect the movies the user has rated
//! 2. Candidates = catalog minus rated set
//! 3. Ask the predictor for one estimate per candidate
//! 4. Stable sort by estimate, highest first
//! 5. Truncate to `top_n`
//!
//! An empty candidate set is an empty result, not an error. A failed
//! estimate aborts the whole request under [`FailurePolicy::AbortBatch`].

use crate::candidates::{rated_ids, unrated_candidates};
use data_loader::{DataIndex, Movie, MovieId, UserId};
use predictor::{PredictionError, Predictor};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Number of recommendations returned when the caller doesn't say
pub const DEFAULT_TOP_N: usize = 5;

/// What to do when the predictor fails for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the whole request; no partial results
    #[default]
    AbortBatch,
    /// Log the failure, drop that candidate and keep going
    SkipCandidate,
}

/// Knobs for a single recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendOptions {
    pub top_n: usize,
    /// Upper bound on time spent in the predictor loop
    pub deadline: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            deadline: None,
            failure_policy: FailurePolicy::AbortBatch,
        }
    }
}

impl RecommendOptions {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// One ranked movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Option<String>,
    pub predicted_rating: f32,
}

impl Recommendation {
    fn new(movie: &Movie, predicted_rating: f32) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            predicted_rating,
        }
    }
}

/// Errors that abort a recommendation request
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Error in generating recommendations: {0}")]
    Prediction(#[from] PredictionError),

    #[error(
        "Recommendation deadline of {limit:?} exceeded after scoring {evaluated} of {total} candidates"
    )]
    DeadlineExceeded {
        limit: Duration,
        evaluated: usize,
        total: usize,
    },
}

/// Top-N unrated movies for `user_id`, best predicted rating first.
///
/// Equal estimates keep catalog order. Works for users with no rating
/// history: every catalog movie is then a candidate.
#[instrument(skip(data, predictor, options), fields(predictor = predictor.name(), top_n = options.top_n))]
pub fn recommend(
    user_id: UserId,
    data: &DataIndex,
    predictor: &dyn Predictor,
    options: &RecommendOptions,
) -> Result<Vec<Recommendation>, RecommendError> {
    let start_time = Instant::now();

    let rated = rated_ids(data, user_id);
    let candidates = unrated_candidates(data, &rated);
    debug!(
        "User {} rated {} movies, {} candidates remain",
        user_id,
        rated.len(),
        candidates.len()
    );

    if candidates.is_empty() || options.top_n == 0 {
        return Ok(Vec::new());
    }

    let scored = score_candidates(user_id, &candidates, predictor, options, start_time)?;
    let recommendations = rank_and_select(scored, options.top_n);

    info!(
        "Selected {} recommendations for user {} in {:.2?}",
        recommendations.len(),
        user_id,
        start_time.elapsed()
    );
    Ok(recommendations)
}

/// One predictor call per candidate, in catalog order
fn score_candidates<'a>(
    user_id: UserId,
    candidates: &[&'a Movie],
    predictor: &dyn Predictor,
    options: &RecommendOptions,
    start_time: Instant,
) -> Result<Vec<(&'a Movie, f32)>, RecommendError> {
    let mut scored = Vec::with_capacity(candidates.len());
    let mut skipped = 0usize;

    for (evaluated, &movie) in candidates.iter().enumerate() {
        if let Some(limit) = options.deadline {
            if start_time.elapsed() >= limit {
                error!(
                    "Deadline of {:?} hit after {} of {} candidates",
                    limit,
                    evaluated,
                    candidates.len()
                );
                return Err(RecommendError::DeadlineExceeded {
                    limit,
                    evaluated,
                    total: candidates.len(),
                });
            }
        }

        match estimate_checked(predictor, user_id, movie.id) {
            Ok(estimate) => scored.push((movie, estimate)),
            Err(e) => match options.failure_policy {
                FailurePolicy::AbortBatch => {
                    error!("Aborting recommendations for user {}: {}", user_id, e);
                    return Err(e.into());
                }
                FailurePolicy::SkipCandidate => {
                    warn!("Skipping movie {}: {}", movie.id, e);
                    skipped += 1;
                }
            },
        }
    }

    if skipped > 0 {
        warn!("Skipped {} of {} candidates", skipped, candidates.len());
    }
    Ok(scored)
}

/// A NaN or infinite estimate would break the ordering, so it counts as a
/// failed prediction.
fn estimate_checked(
    predictor: &dyn Predictor,
    user_id: UserId,
    movie_id: MovieId,
) -> Result<f32, PredictionError> {
    let value = predictor.estimate(user_id, movie_id)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictionError::NonFinite {
            user_id,
            movie_id,
            value,
        })
    }
}

/// Stable sort by score DESC, then take top N
fn rank_and_select(mut scored: Vec<(&Movie, f32)>, limit: usize) -> Vec<Recommendation> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(movie, score)| Recommendation::new(movie, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;
    use predictor::ConstantPredictor;
    use std::collections::HashMap;
    use std::sync::Arc;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Looks scores up in a table; pairs not in the table fail
    struct TablePredictor(HashMap<MovieId, f32>);

    impl Predictor for TablePredictor {
        fn name(&self) -> &str {
            "TablePredictor"
        }

        fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<f32, PredictionError> {
            self.0
                .get(&movie_id)
                .copied()
                .ok_or_else(|| PredictionError::Failed {
                    user_id,
                    movie_id,
                    reason: "no score".to_string(),
                })
        }
    }

    /// Sleeps on every call so deadlines can trip
    struct SlowPredictor(Duration);

    impl Predictor for SlowPredictor {
        fn name(&self) -> &str {
            "SlowPredictor"
        }

        fn estimate(&self, _: UserId, _: MovieId) -> Result<f32, PredictionError> {
            std::thread::sleep(self.0);
            Ok(3.0)
        }
    }

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genres: None,
        }
    }

    fn index(movies: Vec<Movie>, ratings: &[(UserId, MovieId)]) -> DataIndex {
        let ratings: Vec<Rating> = ratings
            .iter()
            .map(|&(user_id, movie_id)| Rating {
                user_id,
                movie_id,
                rating: 4.0,
            })
            .collect();
        DataIndex::from_parts(Arc::from(movies), &ratings).unwrap()
    }

    fn abc_index() -> DataIndex {
        index(
            vec![movie(1, "A"), movie(2, "B"), movie(3, "C")],
            &[(7, 1)],
        )
    }

    // ============================================================================
    // recommend
    // ============================================================================

    #[test]
    fn test_scores_unrated_movies_highest_first() {
        let data = abc_index();
        let predictor = TablePredictor(HashMap::from([(2, 4.5), (3, 3.0)]));

        let recs = recommend(7, &data, &predictor, &RecommendOptions::default()).unwrap();

        let got: Vec<_> = recs
            .iter()
            .map(|r| (r.title.as_str(), r.predicted_rating))
            .collect();
        assert_eq!(got, vec![("B", 4.5), ("C", 3.0)]);
    }

    #[test]
    fn test_empty_catalog_is_empty_result() {
        let data = index(vec![], &[(7, 1)]);
        let recs = recommend(7, &data, &ConstantPredictor(4.0), &RecommendOptions::default())
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_user_who_rated_everything_gets_nothing() {
        let data = index(vec![movie(1, "A")], &[(7, 1)]);
        let recs = recommend(7, &data, &ConstantPredictor(4.0), &RecommendOptions::default())
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_truncates_to_top_n() {
        let movies = (1..=10).map(|id| movie(id, &format!("M{id}"))).collect();
        let data = index(movies, &[]);
        let predictor = TablePredictor((1..=10).map(|id| (id, id as f32 / 2.0)).collect());

        let recs = recommend(1, &data, &predictor, &RecommendOptions::default()).unwrap();

        assert_eq!(recs.len(), DEFAULT_TOP_N);
        let ids: Vec<_> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![10, 9, 8, 7, 6]);
    }

    #[test]
    fn test_top_n_zero_skips_the_predictor() {
        let data = abc_index();
        // Would fail for every movie if it were called
        let predictor = TablePredictor(HashMap::new());

        let recs = recommend(7, &data, &predictor, &RecommendOptions::default().with_top_n(0))
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let data = index(
            vec![movie(30, "X"), movie(10, "Y"), movie(20, "Z")],
            &[],
        );
        let recs = recommend(1, &data, &ConstantPredictor(3.0), &RecommendOptions::default())
            .unwrap();

        let ids: Vec<_> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_single_failure_aborts_batch() {
        let data = abc_index();
        // Movie 3 has no score
        let predictor = TablePredictor(HashMap::from([(2, 4.5)]));

        let err = recommend(7, &data, &predictor, &RecommendOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            RecommendError::Prediction(PredictionError::Failed { movie_id: 3, .. })
        ));
    }

    #[test]
    fn test_skip_policy_drops_failing_candidate() {
        let data = abc_index();
        let predictor = TablePredictor(HashMap::from([(2, 4.5)]));
        let options =
            RecommendOptions::default().with_failure_policy(FailurePolicy::SkipCandidate);

        let recs = recommend(7, &data, &predictor, &options).unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].movie_id, 2);
    }

    #[test]
    fn test_nan_estimate_is_a_prediction_error() {
        let data = abc_index();
        let predictor = TablePredictor(HashMap::from([(2, f32::NAN), (3, 3.0)]));

        let err = recommend(7, &data, &predictor, &RecommendOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            RecommendError::Prediction(PredictionError::NonFinite { movie_id: 2, .. })
        ));
    }

    #[test]
    fn test_deadline_bounds_predictor_loop() {
        let movies = (1..=50).map(|id| movie(id, &format!("M{id}"))).collect();
        let data = index(movies, &[]);
        let predictor = SlowPredictor(Duration::from_millis(5));
        let options = RecommendOptions::default().with_deadline(Duration::from_millis(20));

        let err = recommend(1, &data, &predictor, &options).unwrap_err();

        match err {
            RecommendError::DeadlineExceeded { evaluated, total, .. } => {
                assert!(evaluated < total);
                assert_eq!(total, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_genres_carried_into_result() {
        let mut heat = movie(3, "Heat (1995)");
        heat.genres = Some("Action|Crime|Thriller".to_string());
        let data = index(vec![heat], &[]);

        let recs = recommend(1, &data, &ConstantPredictor(4.0), &RecommendOptions::default())
            .unwrap();

        assert_eq!(recs[0].genres.as_deref(), Some("Action|Crime|Thriller"));
    }
}
