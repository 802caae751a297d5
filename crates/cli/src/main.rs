use als_model::Recommender;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{ArtifactPaths, RawId};
use server::{AppState, ArtifactStore, RecommendError, RecommendationService, ServerConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const EMPTY_MESSAGE: &str = "No recommendations found for this user.";

/// recs - collaborative-filtering recommendations
#[derive(Parser)]
#[command(name = "recs")]
#[command(about = "Serve and inspect ALS item recommendations", long_about = None)]
struct Cli {
    /// Directory holding the model and data artifacts
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Interaction matrix file, relative to the data directory
    #[arg(long, default_value = data_loader::paths::DEFAULT_INTERACTIONS_FILE)]
    interactions: PathBuf,

    /// User id mapping file, relative to the data directory
    #[arg(long, default_value = data_loader::paths::DEFAULT_USER_MAPPINGS_FILE)]
    user_mappings: PathBuf,

    /// Item id mapping file, relative to the data directory
    #[arg(long, default_value = data_loader::paths::DEFAULT_ITEM_MAPPINGS_FILE)]
    item_mappings: PathBuf,

    /// Model file, relative to the data directory
    #[arg(long, default_value = data_loader::paths::DEFAULT_MODEL_FILE)]
    model: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            interactions: self.data_dir.join(&self.interactions),
            user_mappings: self.data_dir.join(&self.user_mappings),
            item_mappings: self.data_dir.join(&self.item_mappings),
            model: self.data_dir.join(&self.model),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web UI
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8501")]
        port: u16,
    },

    /// Print recommendations for a user
    Recommend {
        /// Raw user id, as it appears in the user mapping
        #[arg(long)]
        user_id: String,

        /// Number of recommendations to request
        #[arg(long, default_value = "10")]
        count: usize,
    },

    /// List active users in ascending order
    Users {
        /// Print at most this many users
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show artifact statistics
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = ArtifactStore::new(cli.artifact_paths());
    info!("Reading artifacts from {}", cli.data_dir.display());

    match cli.command {
        Commands::Serve { host, port } => {
            let service = load_service(&store)?;
            let state = AppState::new(service);
            server::serve(ServerConfig { host, port }, state).await?;
        }
        Commands::Recommend { user_id, count } => {
            let service = load_service(&store)?;
            handle_recommend(&service, RawId::new(user_id), count)?;
        }
        Commands::Users { limit } => handle_users(&store, limit)?,
        Commands::Info => handle_info(&store)?,
    }

    Ok(())
}

/// Load every artifact; any failure here is fatal
fn load_service(store: &ArtifactStore) -> Result<RecommendationService> {
    let start = Instant::now();
    let service = store
        .recommendation_service()
        .context("Failed to load model, data, or mappings")?;
    println!(
        "{} Model, data, and mappings loaded in {:?}",
        "✓".green(),
        start.elapsed()
    );
    Ok(service)
}

/// Handle the 'recommend' command
fn handle_recommend(service: &RecommendationService, user: RawId, count: usize) -> Result<()> {
    match service.recommend(&user, count) {
        Ok(recs) if recs.is_empty() => println!("{}", EMPTY_MESSAGE),
        Ok(recs) => {
            println!(
                "{}",
                format!("Top {} Recommendations for User {}:", recs.len(), user)
                    .bold()
                    .blue()
            );
            for rec in &recs {
                println!(
                    "{}. {} {}",
                    rec.rank.to_string().green(),
                    rec.item,
                    format!("(score {:.3})", rec.score).dimmed()
                );
            }
        }
        Err(err @ (RecommendError::UserNotFound(_) | RecommendError::ModelLookup { .. })) => {
            println!("{} {}", "⚠".yellow(), err.to_string().yellow());
            println!("{}", EMPTY_MESSAGE);
        }
        Err(err) => return Err(err).context("Recommendation request failed"),
    }
    Ok(())
}

/// Handle the 'users' command
fn handle_users(store: &ArtifactStore, limit: Option<usize>) -> Result<()> {
    let dataset = store.load_data().context("Failed to load data or mappings")?;
    let users = dataset.active_user_ids();

    println!(
        "{}",
        format!("{} active users:", users.len()).bold().blue()
    );
    for user in users.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("  {}", user);
    }
    Ok(())
}

/// Handle the 'info' command
fn handle_info(store: &ArtifactStore) -> Result<()> {
    let dataset = store.load_data().context("Failed to load data or mappings")?;
    let model = store.load_model().context("Failed to load model")?;

    let (rows, cols) = dataset.matrix().shape();
    let (users, items, interactions) = dataset.counts();
    let (active_users, active_items) = dataset.active().counts();

    println!("{}", "Interaction matrix".bold().blue());
    println!("{}Shape: {} x {}", "• ".green(), rows, cols);
    println!("{}Nonzeros: {}", "• ".green(), interactions);
    println!(
        "{}Active users: {} of {}",
        "• ".green(),
        active_users, users
    );
    println!(
        "{}Active items: {} of {}",
        "• ".green(),
        active_items, items
    );

    println!("{}", "Model".bold().blue());
    println!("{}Factors: {}", "• ".cyan(), model.factors());
    println!("{}Regularization: {}", "• ".cyan(), model.regularization());
    println!("{}Alpha: {}", "• ".cyan(), model.alpha());
    println!(
        "{}Trained users x items: {} x {}",
        "• ".cyan(),
        model.user_count(),
        model.item_count()
    );
    Ok(())
}
