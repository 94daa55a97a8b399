//! Snapshot persistence.
//!
//! Persistence is a collaborator, not part of the engine: a failed save
//! must never block editing, so `save_snapshot` downgrades store errors to
//! a logged warning and a `saved: false` indicator the caller can surface.

use std::path::PathBuf;

use log::warn;

use crate::snapshot::ResumeSnapshot;

/// Key-value style persistence for the raw snapshot JSON.
pub trait SnapshotStore {
    /// Returns the stored JSON, or `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>, String>;
    fn save(&mut self, json: &str) -> Result<(), String>;
}

/// File-backed store used by the CLI.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<String>, String> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| format!("Failed to read {}: {e}", self.path.display()))
    }

    fn save(&mut self, json: &str) -> Result<(), String> {
        std::fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {e}", self.path.display()))
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemStore {
    contents: Option<String>,
    /// When set, every save fails with this message.
    pub fail_saves: Option<String>,
}

impl SnapshotStore for MemStore {
    fn load(&self) -> Result<Option<String>, String> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, json: &str) -> Result<(), String> {
        if let Some(reason) = &self.fail_saves {
            return Err(reason.clone());
        }
        self.contents = Some(json.to_string());
        Ok(())
    }
}

/// Persist a snapshot. Returns whether the write actually happened; a
/// store failure is logged and reported, never propagated.
pub fn save_snapshot(store: &mut dyn SnapshotStore, snapshot: &ResumeSnapshot) -> bool {
    match store.save(&snapshot.to_json()) {
        Ok(()) => true,
        Err(e) => {
            warn!("snapshot not saved: {e}");
            false
        }
    }
}
