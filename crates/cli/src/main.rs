mod render;
mod repl;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use data_loader::UserId;
use recommender::{FailurePolicy, Recommendation, RecommendOptions, DEFAULT_TOP_N};
use service::{
    AppConfig, Outcome, Session, DEFAULT_MODEL_PATH, DEFAULT_MOVIES_PATH, DEFAULT_RATINGS_PATH,
};

use crate::render::Console;

/// ReelRecs - Top-N Movie Recommender
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Top-N movie recommendations from a pre-trained SVD model", long_about = None)]
struct Cli {
    /// Movie catalog CSV (movieId,title,genres)
    #[arg(long, global = true, default_value = DEFAULT_MOVIES_PATH)]
    movies: PathBuf,

    /// Rating history CSV (userId,movieId,rating)
    #[arg(long, global = true, default_value = DEFAULT_RATINGS_PATH)]
    ratings: PathBuf,

    /// Pre-trained model artifact
    #[arg(long, global = true, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Number of recommendations to return
    #[arg(long, global = true, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Fail a request that takes longer than this many milliseconds
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,

    /// Skip movies the model cannot score instead of failing the request
    #[arg(long, global = true)]
    skip_failed: bool,

    /// Show info-level logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        user_id: UserId,

        /// Exact title of the selected movie
        #[arg(long)]
        movie: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show what was loaded
    Info,

    /// Enter users, pick movies and request recommendations at a prompt
    Interactive,
}

impl Cli {
    fn config(&self) -> AppConfig {
        let mut options = RecommendOptions::default().with_top_n(self.top_n);
        if let Some(ms) = self.deadline_ms {
            options = options.with_deadline(Duration::from_millis(ms));
        }
        if self.skip_failed {
            options = options.with_failure_policy(FailurePolicy::SkipCandidate);
        }

        AppConfig {
            movies_path: self.movies.clone(),
            ratings_path: self.ratings.clone(),
            model_path: self.model.clone(),
            options,
        }
    }
}

/// How a command finished; mapped onto the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries results
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let json = matches!(cli.command, Commands::Recommend { json: true, .. });
    let mut console = Console::stdio(json);

    let config = cli.config();
    tracing::debug!("Starting with {:?}", config);
    console.line(&format!(
        "Loading {}, {} and {}...",
        config.movies_path.display(),
        config.ratings_path.display(),
        config.model_path.display()
    ))?;
    let start = Instant::now();
    let mut session = Session::start(&config).await;

    if let Some(reason) = session.disabled_reason() {
        console.error(reason)?;
        return Ok(ExitCode::FAILURE);
    }
    console.success(&format!("Loaded dataset and model in {:.2?}", start.elapsed()))?;

    let status = match cli.command {
        Commands::Recommend { user_id, movie, .. } => {
            handle_recommend(&mut console, &mut session, user_id, &movie).await?
        }
        Commands::Search { title, limit } => {
            handle_search(&mut console, &session, &title, limit)?
        }
        Commands::Info => handle_info(&mut console, &session)?,
        Commands::Interactive => {
            repl::run(&mut console, &mut session).await?;
            Status::Success
        }
    };
    console.flush()?;
    Ok(status.into())
}

/// Handle the 'recommend' command
async fn handle_recommend<O: Write, E: Write>(
    console: &mut Console<O, E>,
    session: &mut Session,
    user_id: UserId,
    title: &str,
) -> Result<Status> {
    if let Some(warning) = session.set_user(user_id)? {
        console.user_warning(&warning)?;
    }
    if let Err(e) = session.select_movie(title) {
        console.error(&e.to_string())?;
        return Ok(Status::Failure);
    }

    let outcome = match session.recommend().await {
        Ok(outcome) => outcome,
        Err(e) => {
            console.error(&e.to_string())?;
            return Ok(Status::Failure);
        }
    };

    if let Some(warning) = outcome.warning() {
        console.user_warning(&warning)?;
    }
    let recommendations: &[Recommendation] = match &outcome {
        Outcome::Ranked(recs) => recs.as_slice(),
        Outcome::Empty => &[],
    };

    if console.is_json() {
        console
            .recommendations_json(recommendations)
            .context("Failed to write recommendations as JSON")?;
    } else if !recommendations.is_empty() {
        console.recommendations(recommendations)?;
    }
    Ok(Status::Success)
}

/// Handle the 'search' command
fn handle_search<O: Write, E: Write>(
    console: &mut Console<O, E>,
    session: &Session,
    title: &str,
    limit: usize,
) -> Result<Status> {
    let matches = session.search(title, limit)?;
    console.search_results(title, &matches)?;
    Ok(Status::Success)
}

/// Handle the 'info' command
fn handle_info<O: Write, E: Write>(
    console: &mut Console<O, E>,
    session: &Session,
) -> Result<Status> {
    let context = session.context()?;
    let (users, movies, ratings) = context.data().counts();
    let options = session.options();

    console.success("Recommendations enabled")?;
    console.line(&format!("  Movies:    {}", movies))?;
    console.line(&format!("  Users:     {}", users))?;
    console.line(&format!("  Ratings:   {}", ratings))?;
    console.line(&format!("  Model:     {}", context.predictor().name()))?;
    console.line(&format!("  Top N:     {}", options.top_n))?;
    Ok(Status::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{captured, output};
    use data_loader::{DataIndex, Movie, MovieId, Rating};
    use predictor::{LatentFactors, PredictionError, Predictor, SvdModel};
    use service::AppContext;
    use std::fs;
    use std::sync::Arc;

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn name(&self) -> &str {
            "FailingPredictor"
        }

        fn estimate(&self, user_id: UserId, movie_id: MovieId) -> Result<f32, PredictionError> {
            Err(PredictionError::Failed {
                user_id,
                movie_id,
                reason: "model exploded".to_string(),
            })
        }
    }

    /// Writes catalog A/B/C, user 7 rated A, and a model scoring B above C
    fn write_fixture(dir: &tempfile::TempDir) -> AppConfig {
        let config = AppConfig {
            movies_path: dir.path().join("movie.csv"),
            ratings_path: dir.path().join("rating.csv"),
            model_path: dir.path().join("svd_model.pb"),
            ..AppConfig::default()
        };
        fs::write(
            &config.movies_path,
            "movieId,title,genres\n1,A,Comedy\n2,B,Drama\n3,C,\n",
        )
        .unwrap();
        fs::write(&config.ratings_path, "userId,movieId,rating\n7,1,4.0\n").unwrap();

        let mut model = SvdModel::new(3.5, 0.5, 5.0, 1).unwrap();
        model.insert_user(7, LatentFactors::new(0.0, vec![1.0])).unwrap();
        model.insert_item(2, LatentFactors::new(1.0, vec![0.0])).unwrap();
        model.insert_item(3, LatentFactors::new(-0.5, vec![0.0])).unwrap();
        fs::write(&config.model_path, model.encode_to_vec()).unwrap();
        config
    }

    async fn start_session(dir: &tempfile::TempDir) -> Session {
        let session = Session::start(&write_fixture(dir)).await;
        assert!(session.is_enabled(), "{:?}", session.disabled_reason());
        session
    }

    #[tokio::test]
    async fn test_recommend_prints_ratings_and_genres() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = start_session(&dir).await;
        let mut console = captured(false);

        let status = handle_recommend(&mut console, &mut session, 7, "A").await.unwrap();
        let (out, err) = output(console);

        assert_eq!(status, Status::Success);
        assert!(out.contains("B (Rating: 4.50)"), "{out}");
        assert!(out.contains("Genre: Drama"));
        assert!(out.contains("C (Rating: 3.00)"));
        assert!(out.contains("Genre: N/A"));
        assert!(err.is_empty(), "{err}");
    }

    #[tokio::test]
    async fn test_recommend_json_stdout_is_only_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = start_session(&dir).await;
        let mut console = captured(true);

        // Unknown user: the warning must not land on stdout
        let status = handle_recommend(&mut console, &mut session, 99, "A").await.unwrap();
        let (out, err) = output(console);

        assert_eq!(status, Status::Success);
        let recs: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(recs.len(), 3);
        assert!(err.contains("User ID 99 not found"), "{err}");
    }

    #[tokio::test]
    async fn test_recommend_json_body() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = start_session(&dir).await;
        let mut console = captured(true);

        handle_recommend(&mut console, &mut session, 7, "A").await.unwrap();
        let (out, _) = output(console);

        let recs: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        let titles: Vec<_> = recs.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["B", "C"]);
        assert_eq!(recs[0]["predicted_rating"], 4.5);
        assert_eq!(recs[1]["genres"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_recommend_json_empty_outcome_warns_on_stderr() {
        let movies: Arc<[Movie]> = vec![Movie {
            id: 1,
            title: "A".to_string(),
            genres: None,
        }]
        .into();
        let ratings = [Rating {
            user_id: 7,
            movie_id: 1,
            rating: 4.0,
        }];
        let data = DataIndex::from_parts(movies, &ratings).unwrap();
        let context = AppContext::new(Arc::new(data), Arc::new(predictor::ConstantPredictor(3.0)));
        let mut session = Session::ready(context, RecommendOptions::default());
        let mut console = captured(true);

        let status = handle_recommend(&mut console, &mut session, 7, "A").await.unwrap();
        let (out, err) = output(console);

        assert_eq!(status, Status::Success);
        let recs: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert!(recs.is_empty());
        assert!(err.contains("No related movies found."), "{err}");
    }

    #[tokio::test]
    async fn test_recommend_unknown_title_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = start_session(&dir).await;
        let mut console = captured(false);

        let status = handle_recommend(&mut console, &mut session, 7, "Z").await.unwrap();
        let (out, err) = output(console);

        assert_eq!(status, Status::Failure);
        assert!(err.contains("Movie not found in catalog: Z"), "{err}");
        assert!(!out.contains("Recommended"));
    }

    #[tokio::test]
    async fn test_recommend_prediction_failure_fails() {
        let movies: Arc<[Movie]> = vec![Movie {
            id: 1,
            title: "A".to_string(),
            genres: None,
        }]
        .into();
        let data = DataIndex::from_parts(movies, &[]).unwrap();
        let context = AppContext::new(Arc::new(data), Arc::new(FailingPredictor));
        let mut session = Session::ready(context, RecommendOptions::default());
        let mut console = captured(true);

        let status = handle_recommend(&mut console, &mut session, 7, "A").await.unwrap();
        let (out, err) = output(console);

        assert_eq!(status, Status::Failure);
        assert!(out.is_empty());
        assert!(err.contains("Error in generating recommendations"), "{err}");
    }

    #[tokio::test]
    async fn test_search_lists_matches() {
        let dir = tempfile::tempdir().unwrap();
        let session = start_session(&dir).await;
        let mut console = captured(false);

        let status = handle_search(&mut console, &session, "b", 20).unwrap();
        let (out, _) = output(console);

        assert_eq!(status, Status::Success);
        assert!(out.contains("#1 B [Drama] (id 2)"), "{out}");
    }

    #[tokio::test]
    async fn test_info_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let session = start_session(&dir).await;
        let mut console = captured(false);

        let status = handle_info(&mut console, &session).unwrap();
        let (out, _) = output(console);

        assert_eq!(status, Status::Success);
        assert!(out.contains("Movies:    3"));
        assert!(out.contains("Users:     1"));
        assert!(out.contains("Model:     SVD"));
    }

    #[test]
    fn test_defaults_need_no_flags() {
        let cli = Cli::parse_from(["reel-recs", "info"]);
        let config = cli.config();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "reel-recs",
            "--top-n",
            "10",
            "--deadline-ms",
            "250",
            "--skip-failed",
            "recommend",
            "--user-id",
            "7",
            "--movie",
            "Toy Story (1995)",
        ]);
        let options = cli.config().options;

        assert_eq!(options.top_n, 10);
        assert_eq!(options.deadline, Some(Duration::from_millis(250)));
        assert_eq!(options.failure_policy, FailurePolicy::SkipCandidate);
    }

    #[test]
    fn test_user_id_must_be_positive() {
        let parsed = Cli::try_parse_from([
            "reel-recs",
            "recommend",
            "--user-id",
            "0",
            "--movie",
            "A",
        ]);
        assert!(parsed.is_err());
    }
}
