//! Checkpoint storage for campaign sessions.
//!
//! A checkpoint wraps a [`SavedSession`] with the session id and the time it
//! was taken. Stores are keyed by campaign id; saving replaces the previous
//! checkpoint of the same campaign.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CampaignResult;
use crate::session::SavedSession;

/// Unique identifier of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The session that wrote it.
    pub session_id: SessionId,
    /// When it was written.
    pub saved_at: DateTime<Utc>,
    /// The session itself.
    pub session: SavedSession,
}

impl Checkpoint {
    /// Stamp a saved session with the current time.
    pub fn new(session_id: SessionId, session: SavedSession) -> Self {
        Self {
            session_id,
            saved_at: Utc::now(),
            session,
        }
    }

    /// Key the checkpoint is stored under.
    pub fn key(&self) -> &str {
        &self.session.campaign_id
    }
}

/// Somewhere checkpoints can be written to and read back from.
pub trait CheckpointStore: fmt::Debug {
    /// Store `checkpoint`, replacing any other under the same key.
    fn save(&mut self, checkpoint: &Checkpoint) -> CampaignResult<()>;

    /// The checkpoint stored under `key`.
    fn load(&self, key: &str) -> CampaignResult<Option<Checkpoint>>;

    /// Delete the checkpoint under `key`. Returns whether one existed.
    fn remove(&mut self, key: &str) -> CampaignResult<bool>;
}

/// Checkpoints held in memory as JSON blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checkpoints.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl CheckpointStore for MemoryStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> CampaignResult<()> {
        let blob = serde_json::to_string(checkpoint)?;
        self.blobs.insert(checkpoint.key().to_string(), blob);
        Ok(())
    }

    fn load(&self, key: &str) -> CampaignResult<Option<Checkpoint>> {
        self.blobs
            .get(key)
            .map(|blob| serde_json::from_str(blob))
            .transpose()
            .map_err(Into::into)
    }

    fn remove(&mut self, key: &str) -> CampaignResult<bool> {
        Ok(self.blobs.remove(key).is_some())
    }
}

/// Checkpoints written as `<key>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Store checkpoints in `dir`, which is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The checkpoint directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the checkpoint for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CheckpointStore for JsonDirStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> CampaignResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(checkpoint.key());
        // Write beside the target, then rename over it.
        let partial = path.with_extension("json.partial");
        fs::write(&partial, serde_json::to_string_pretty(checkpoint)?)?;
        fs::rename(&partial, &path)?;
        tracing::info!(path = %path.display(), "checkpoint saved");
        Ok(())
    }

    fn load(&self, key: &str) -> CampaignResult<Option<Checkpoint>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn remove(&mut self, key: &str) -> CampaignResult<bool> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::CampaignState;

    fn checkpoint(campaign: &str) -> Checkpoint {
        Checkpoint::new(
            SessionId::new(),
            SavedSession {
                campaign_id: campaign.to_string(),
                initial: CampaignState::new(),
                scenarios: Vec::new(),
            },
        )
    }

    #[test]
    fn session_id_display_is_short() {
        let id = SessionId(Uuid::parse_str("a3f2b1c8-1234-5678-9abc-def012345678").unwrap());
        assert_eq!(id.to_string(), "a3f2b1c8");
    }

    #[test]
    fn memory_store_replaces_by_campaign() {
        let mut store = MemoryStore::new();
        let first = checkpoint("night");
        let second = checkpoint("night");
        store.save(&first).unwrap();
        store.save(&second).unwrap();
        store.save(&checkpoint("dunwich")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.load("night").unwrap(), Some(second));
        assert!(store.remove("night").unwrap());
        assert!(!store.remove("night").unwrap());
        assert_eq!(store.load("night").unwrap(), None);
    }

    #[test]
    fn json_dir_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(dir.path().join("saves"));
        assert_eq!(store.load("night").unwrap(), None);

        let cp = checkpoint("night");
        store.save(&cp).unwrap();
        assert!(store.path_for("night").exists());
        assert!(!store.path_for("night").with_extension("json.partial").exists());
        assert_eq!(store.load("night").unwrap(), Some(cp));

        assert!(store.remove("night").unwrap());
        assert_eq!(store.load("night").unwrap(), None);
    }

    #[test]
    fn corrupt_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        fs::write(store.path_for("night"), "{not json").unwrap();
        assert!(matches!(
            store.load("night"),
            Err(crate::error::CampaignError::Json(_))
        ));
    }
}
