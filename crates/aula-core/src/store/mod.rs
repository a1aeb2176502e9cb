//! Snapshot persistence abstraction.
//!
//! The [`SnapshotStore`] trait is the only way the [`DocumentIndex`](crate::index::DocumentIndex)
//! touches durable state: it loads the whole fragment collection once, and
//! rewrites the whole collection after every mutation. There is no
//! incremental or journaled persistence.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`load`](SnapshotStore::load) | Read the stored collection, `None` if there is none |
//! | [`save`](SnapshotStore::save) | Replace the stored collection |
//! | [`remove`](SnapshotStore::remove) | Delete the stored collection |

pub mod memory;

use anyhow::Result;

use crate::models::Fragment;

/// Backend for the index snapshot.
pub trait SnapshotStore {
    /// Read the stored fragments. `Ok(None)` means no snapshot exists yet.
    fn load(&self) -> Result<Option<Vec<Fragment>>>;

    /// Overwrite the snapshot with `fragments`.
    fn save(&self, fragments: &[Fragment]) -> Result<()>;

    /// Delete the snapshot. Deleting a missing snapshot is not an error.
    fn remove(&self) -> Result<()>;
}
