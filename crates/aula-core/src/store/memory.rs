//! In-memory [`SnapshotStore`] for tests and embedding without a disk.
//!
//! Holds the snapshot as serialized JSON so a save/load cycle goes through
//! the same serde representation the on-disk store uses.

use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::models::Fragment;

use super::SnapshotStore;

/// Snapshot kept in process memory.
#[derive(Default)]
pub struct MemorySnapshot {
    blob: RwLock<Option<String>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw snapshot, e.g. a corrupt one.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(raw.into())),
        }
    }

    /// Whether a snapshot is currently stored.
    pub fn exists(&self) -> bool {
        self.blob.read().map(|b| b.is_some()).unwrap_or(false)
    }

    /// Number of fragments in the stored snapshot, if it decodes.
    pub fn stored_len(&self) -> Option<usize> {
        self.load().ok().flatten().map(|f| f.len())
    }
}

impl SnapshotStore for MemorySnapshot {
    fn load(&self) -> Result<Option<Vec<Fragment>>> {
        let blob = self
            .blob
            .read()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?;
        match blob.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, fragments: &[Fragment]) -> Result<()> {
        let raw = serde_json::to_string(fragments)?;
        let mut blob = self
            .blob
            .write()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?;
        *blob = Some(raw);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut blob = self
            .blob
            .write()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?;
        *blob = None;
        Ok(())
    }
}
