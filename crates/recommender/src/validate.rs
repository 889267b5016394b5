//! Input validation for a recommendation request.
//!
//! An unknown user is only worth a warning: the engine treats them as a
//! cold-start user. A movie selection must resolve to a catalog row.

use data_loader::{DataIndex, Movie, UserId};

/// True iff the user appears in at least one rating row
pub fn user_exists(user_id: UserId, data: &DataIndex) -> bool {
    data.has_user(user_id)
}

/// Exact-title lookup.
///
/// When several catalog rows share a title, the first one in load order is
/// returned; there is no secondary key to tell them apart.
pub fn resolve_movie<'a>(title: &str, data: &'a DataIndex) -> Option<&'a Movie> {
    data.get_movie_by_title(title)
}

/// Case-insensitive title search backing the movie picker.
///
/// Exact matches come first, then substring matches, each group in catalog
/// order. An empty query matches nothing.
pub fn search_titles<'a>(query: &str, data: &'a DataIndex, limit: usize) -> Vec<&'a Movie> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut exact = Vec::new();
    let mut partial = Vec::new();
    for movie in data.movies() {
        let title = movie.title.to_lowercase();
        if title == query {
            exact.push(movie);
        } else if title.contains(&query) {
            partial.push(movie);
        }
    }

    exact.extend(partial);
    exact.truncate(limit);
    exact
}
