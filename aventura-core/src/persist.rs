//! Game persistence for save/load functionality.
//!
//! A game is stored as one JSON snapshot under a single fixed key. The
//! storage itself sits behind [`SaveStore`] so the session can run against
//! a file on disk or an in-memory blob.

use crate::character::Character;
use crate::enemy::Enemy;
use crate::log::StoryLog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// The key the snapshot is stored under.
pub const SAVE_KEY: &str = "dnd_ai_dm_savegame";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The stored snapshot exists but cannot be used.
    #[error("Corrupted save: {0}")]
    Corrupted(String),

    /// Storage refused the snapshot (unavailable, full, read-only).
    #[error("Write failed: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub character: Character,
    pub story_log: StoryLog,
    pub is_in_combat: bool,
    pub enemy: Option<Enemy>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistError::Write(e.to_string()))
    }

    /// Parse and validate a stored snapshot.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| PersistError::Corrupted(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reject snapshots that break the character or enemy invariants.
    pub fn validate(&self) -> Result<(), PersistError> {
        self.character
            .check_invariants()
            .map_err(PersistError::Corrupted)?;

        if let Some(enemy) = &self.enemy {
            if enemy.current_hp > enemy.max_hp {
                return Err(PersistError::Corrupted(format!(
                    "enemy currentHp {} exceeds maxHp {}",
                    enemy.current_hp, enemy.max_hp
                )));
            }
        }
        Ok(())
    }
}

/// Durable storage for the single game snapshot.
#[async_trait]
pub trait SaveStore: Send + Sync {
    /// Whether a snapshot is stored.
    async fn exists(&self) -> bool;

    /// The stored snapshot text, if any.
    async fn read(&self) -> Result<Option<String>, PersistError>;

    /// Replace the stored snapshot.
    async fn write(&self, contents: &str) -> Result<(), PersistError>;

    /// Remove the stored snapshot. Removing a missing snapshot succeeds.
    async fn delete(&self) -> Result<(), PersistError>;
}

/// Stores the snapshot as `<dir>/dnd_ai_dm_savegame.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SAVE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SaveStore for FileStore {
    async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(PersistError::Corrupted(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, contents: &str) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PersistError::Write(e.to_string()))?;
        }
        fs::write(&self.path, contents)
            .await
            .map_err(|e| PersistError::Write(e.to_string()))
    }

    async fn delete(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store. Clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds the given snapshot text.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(contents.into()))),
            fail_writes: Arc::default(),
        }
    }

    /// Make every following write fail, as a full or read-only storage would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The raw stored text.
    pub async fn contents(&self) -> Option<String> {
        self.blob.lock().await.clone()
    }
}

#[async_trait]
impl SaveStore for MemoryStore {
    async fn exists(&self) -> bool {
        self.blob.lock().await.is_some()
    }

    async fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.blob.lock().await.clone())
    }

    async fn write(&self, contents: &str) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Write("storage unavailable".to_string()));
        }
        *self.blob.lock().await = Some(contents.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<(), PersistError> {
        *self.blob.lock().await = None;
        Ok(())
    }
}

/// Load the stored snapshot. `Ok(None)` when nothing is stored.
pub async fn load_snapshot(store: &dyn SaveStore) -> Result<Option<GameSnapshot>, PersistError> {
    match store.read().await? {
        Some(json) => GameSnapshot::from_json(&json).map(Some),
        None => Ok(None),
    }
}

/// Write the snapshot, replacing any previous one.
pub async fn save_snapshot(store: &dyn SaveStore, snapshot: &GameSnapshot) -> Result<(), PersistError> {
    let json = snapshot.to_json()?;
    store.write(&json).await
}
