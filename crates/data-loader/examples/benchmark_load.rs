use data_loader::{DataIndex, DatasetCache};
use std::path::Path;
use std::time::Instant;

fn main() {
    let movies_path = Path::new("movie.csv");
    let ratings_path = Path::new("rating.csv");
    let cache = DatasetCache::new();

    println!("Loading catalog and ratings...\n");

    let start = Instant::now();
    let index = match DataIndex::load_with_cache(&cache, movies_path, ratings_path) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Failed to load dataset: {e}");
            std::process::exit(1);
        }
    };
    let cold = start.elapsed();

    // Second load only rebuilds the lookups
    let start = Instant::now();
    let _ = DataIndex::load_with_cache(&cache, movies_path, ratings_path);
    let warm = start.elapsed();

    let (users, movies, ratings) = index.counts();

    println!("\n=== Load Complete ===");
    println!("Cold load: {:?}", cold);
    println!("Warm load: {:?}", warm);
    println!("Users: {}", users);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / cold.as_secs_f64());
}
