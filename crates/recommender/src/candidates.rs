//! Candidate generation: every catalog movie the user has not rated.
//!
//! There's no point in recommending movies the user has already seen, so
//! the rated set is built once as a HashSet and the catalog is filtered
//! against it with O(1) lookups.

use data_loader::{DataIndex, Movie, MovieId, UserId};
use std::collections::HashSet;

/// Movie ids the user has rated (empty for a cold-start user)
pub fn rated_ids(data: &DataIndex, user_id: UserId) -> HashSet<MovieId> {
    data.get_user_ratings(user_id)
        .iter()
        .map(|rating| rating.movie_id)
        .collect()
}

/// Catalog movies not in `rated`, in catalog order
pub fn unrated_candidates<'a>(data: &'a DataIndex, rated: &HashSet<MovieId>) -> Vec<&'a Movie> {
    data.movies()
        .iter()
        .filter(|movie| !rated.contains(&movie.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;
    use std::sync::Arc;

    fn movie(id: MovieId) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            genres: None,
        }
    }

    #[test]
    fn test_rated_movies_are_excluded() {
        let movies: Arc<[Movie]> = vec![movie(100), movie(101), movie(200), movie(300)].into();
        let ratings = vec![
            Rating { user_id: 1, movie_id: 100, rating: 4.0 },
            Rating { user_id: 1, movie_id: 200, rating: 2.0 },
            Rating { user_id: 2, movie_id: 101, rating: 5.0 },
        ];
        let index = DataIndex::from_parts(movies, &ratings).unwrap();

        let rated = rated_ids(&index, 1);
        let ids: Vec<_> = unrated_candidates(&index, &rated)
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(ids, vec![101, 300]);
    }

    #[test]
    fn test_cold_start_user_gets_whole_catalog() {
        let movies: Arc<[Movie]> = vec![movie(1), movie(2)].into();
        let index = DataIndex::from_parts(movies, &[]).unwrap();

        let rated = rated_ids(&index, 42);
        assert!(rated.is_empty());
        assert_eq!(unrated_candidates(&index, &rated).len(), 2);
    }
}
