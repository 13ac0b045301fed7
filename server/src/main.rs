use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::dictionary::Dictionary;
use server::leaderboard::Leaderboard;
use server::network::Server;
use server::persistence::FileSnapshotStore;
use shared::SCORES_LENGTH;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Directory containing the words-<lang>.txt files
    #[clap(short, long, default_value = "dictionaries")]
    dictionaries: PathBuf,
    /// Delay in milliseconds added before processing each message
    #[clap(short, long, default_value = "0")]
    latency: u64,
    /// Entries kept in each leaderboard category
    #[clap(long, default_value_t = SCORES_LENGTH)]
    scores_length: usize,
    /// Directory of the top scores snapshots, persistence is disabled if absent
    #[clap(long)]
    snapshot_dir: Option<PathBuf>,
    /// Environment name, snapshots of other environments are never touched
    #[clap(short, long, default_value = "dev")]
    environment: String,
    /// Seconds between two top scores saves, 0 to save only at shutdown
    #[clap(long, default_value = "300")]
    save_period: u64,
    /// Seconds between two statistics log lines, 0 to disable them
    #[clap(long, default_value = "60")]
    stats_period: u64,
    /// Maximum number of simultaneous connections
    #[clap(long, default_value = "1000")]
    max_clients: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            address: format!("{}:{}", args.host, args.port),
            dictionaries_dir: args.dictionaries,
            latency: Duration::from_millis(args.latency),
            scores_length: args.scores_length,
            snapshot_dir: args.snapshot_dir,
            environment: args.environment,
            save_period: Duration::from_secs(args.save_period),
            stats_period: Duration::from_secs(args.stats_period),
            max_clients: args.max_clients,
        }
    }
}

fn build_leaderboard(config: &ServerConfig) -> Leaderboard {
    let leaderboard = match &config.snapshot_dir {
        Some(dir) => Leaderboard::with_store(
            config.scores_length,
            Arc::new(FileSnapshotStore::new(dir)),
            config.environment.clone(),
        ),
        None => Leaderboard::new(config.scores_length),
    };
    leaderboard.load();
    leaderboard
}

/// Main-method of the application.
/// Loads the dictionaries and the top scores, then serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());

    let dictionary = Dictionary::load(&config.dictionaries_dir)?;

    let leaderboard = Arc::new(build_leaderboard(&config));
    let server = Server::bind(&config, Arc::new(dictionary), Arc::clone(&leaderboard)).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    if config.persistence_enabled() {
        let saved = tokio::task::spawn_blocking(move || leaderboard.save()).await?;
        if saved {
            info!("Top scores saved before exit");
        }
    }

    Ok(())
}
