//! Storage of the leaderboard snapshot.
//!
//! A snapshot holds every category's ordered top scores for one deployment
//! environment. It is read once at startup and replaced wholesale on save.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::{GameCategory, TopScore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("snapshot belongs to environment '{found}', expected '{expected}'")]
    EnvironmentMismatch { expected: String, found: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub category: GameCategory,
    pub scores: Vec<TopScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopScoresSnapshot {
    pub environment_name: String,
    pub top_scores: Vec<CategoryScores>,
}

/// Backend able to persist leaderboard snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Returns the snapshot of the environment, `None` if nothing was saved yet.
    fn load(&self, environment_name: &str) -> Result<Option<TopScoresSnapshot>, PersistenceError>;

    /// Replaces the stored snapshot of `snapshot.environment_name`.
    fn save(&self, snapshot: &TopScoresSnapshot) -> Result<(), PersistenceError>;
}

/// Stores one bincode file per environment in a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, environment_name: &str) -> PathBuf {
        self.dir.join(format!("top-scores-{}.bin", environment_name))
    }

    fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, environment_name: &str) -> Result<Option<TopScoresSnapshot>, PersistenceError> {
        let path = self.path_for(environment_name);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };

        let snapshot: TopScoresSnapshot = bincode::deserialize(&data)?;
        if snapshot.environment_name != environment_name {
            return Err(PersistenceError::EnvironmentMismatch {
                expected: environment_name.to_string(),
                found: snapshot.environment_name,
            });
        }

        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &TopScoresSnapshot) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let path = self.path_for(&snapshot.environment_name);
        let data = bincode::serialize(snapshot)?;

        // Write then rename so a crash never leaves a truncated snapshot
        let tmp_path = path.with_extension("bin.tmp");
        std::fs::write(&tmp_path, data).map_err(|e| Self::io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| Self::io_error(&path, e))?;
        Ok(())
    }
}

/// Keeps snapshots in memory, for tests and throwaway deployments.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, TopScoresSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, environment_name: &str) -> Option<TopScoresSnapshot> {
        self.snapshots.lock().get(environment_name).cloned()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, environment_name: &str) -> Result<Option<TopScoresSnapshot>, PersistenceError> {
        Ok(self.get(environment_name))
    }

    fn save(&self, snapshot: &TopScoresSnapshot) -> Result<(), PersistenceError> {
        self.snapshots
            .lock()
            .insert(snapshot.environment_name.clone(), snapshot.clone());
        Ok(())
    }
}
