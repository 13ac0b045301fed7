//! Runtime settings of the server, filled from the command line.

use shared::SCORES_LENGTH;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to listen on, port 0 picks a free one
    pub address: String,
    /// Directory holding the `words-<lang>.txt` files
    pub dictionaries_dir: PathBuf,
    /// Artificial delay before each inbound message is processed
    pub latency: Duration,
    /// Entries in each leaderboard category
    pub scores_length: usize,
    /// Where snapshots are stored, `None` disables persistence
    pub snapshot_dir: Option<PathBuf>,
    pub environment: String,
    /// Zero disables periodic saves
    pub save_period: Duration,
    /// Zero disables the statistics log line
    pub stats_period: Duration,
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            dictionaries_dir: PathBuf::from("dictionaries"),
            latency: Duration::ZERO,
            scores_length: SCORES_LENGTH,
            snapshot_dir: None,
            environment: "dev".to_string(),
            save_period: Duration::from_secs(300),
            stats_period: Duration::from_secs(60),
            max_clients: 1000,
        }
    }
}

impl ServerConfig {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.snapshot_dir.is_some()
    }
}
