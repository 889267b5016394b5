//! Process-wide cache of parsed data files.
//!
//! Each file is parsed at most once per path for the life of the process.
//! Concurrent first callers for the same path serialize on a per-path slot,
//! so exactly one of them reads the file and the rest observe its result.
//! A failed load is not cached; the next caller tries again.

use crate::error::Result;
use crate::parser;
use crate::types::{Movie, Rating};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::debug;

type Slot<T> = Arc<Mutex<Option<Arc<[T]>>>>;

/// Parsed rows keyed by the path they were read from
#[derive(Debug, Default)]
pub struct DatasetCache {
    movies: Mutex<HashMap<PathBuf, Slot<Movie>>>,
    ratings: Mutex<HashMap<PathBuf, Slot<Rating>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(DatasetCache::new)
    }

    /// Movie catalog at `path`, parsed on first use
    pub fn load_movies(&self, path: &Path) -> Result<Arc<[Movie]>> {
        load_once(&self.movies, path, parser::parse_movies)
    }

    /// Rating history at `path`, parsed on first use
    pub fn load_ratings(&self, path: &Path) -> Result<Arc<[Rating]>> {
        load_once(&self.ratings, path, parser::parse_ratings)
    }
}

fn load_once<T>(
    slots: &Mutex<HashMap<PathBuf, Slot<T>>>,
    path: &Path,
    parse: impl FnOnce(&Path) -> Result<Vec<T>>,
) -> Result<Arc<[T]>> {
    // Hold the map lock only long enough to find this path's slot
    let slot = lock(slots)
        .entry(path.to_path_buf())
        .or_default()
        .clone();

    let mut cached = lock(&slot);
    if let Some(rows) = cached.as_ref() {
        debug!("Cache hit for {}", path.display());
        return Ok(rows.clone());
    }

    let rows: Arc<[T]> = parse(path)?.into();
    *cached = Some(rows.clone());
    Ok(rows)
}

/// Cached rows are immutable once written, so a poisoned lock still guards
/// consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
