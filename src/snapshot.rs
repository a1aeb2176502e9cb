//! File-backed [`SnapshotStore`].
//!
//! The snapshot is the full fragment collection (token caches included)
//! serialized as JSON at a fixed path. Writes go to a sibling temp file
//! that is then renamed over the snapshot, so a crash mid-write leaves the
//! previous snapshot intact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use aula_core::store::SnapshotStore;
use aula_core::Fragment;

/// Snapshot stored in a single JSON file.
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshot {
    fn load(&self) -> Result<Option<Vec<Fragment>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        let fragments = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to decode snapshot: {}", self.path.display()))?;
        Ok(Some(fragments))
    }

    fn save(&self, fragments: &[Fragment]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_vec(fragments)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, raw)
            .with_context(|| format!("Failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace snapshot: {}", self.path.display()))?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete snapshot: {}", self.path.display())),
        }
    }
}
