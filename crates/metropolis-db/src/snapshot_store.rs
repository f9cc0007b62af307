//! JSON snapshot persistence for [`MemoryStore`].
//!
//! A snapshot is the whole store plus the tick it was taken at. Writes go to
//! a sibling temp file first and are renamed into place, so a crash while
//! saving leaves the previous snapshot intact. Restart/resume loads the
//! latest snapshot; the city watermarks inside it stop daily pipelines from
//! re-running a day that already ran.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::memory::MemoryStore;

/// Current on-disk format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A persisted copy of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version of this file.
    pub format_version: u32,
    /// Last completed tick when the snapshot was taken.
    pub tick: u64,
    /// Wall-clock time of the save.
    pub saved_at: DateTime<Utc>,
    /// The store contents.
    pub store: MemoryStore,
}

/// Reads and writes snapshots at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a snapshot store bound to a file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `store` as the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] or [`StoreError::Io`].
    pub fn save(&self, store: &MemoryStore, tick: u64) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            tick,
            saved_at: Utc::now(),
            store: store.clone(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(tick, path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    /// Load the latest snapshot, or `None` if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for unreadable files and
    /// [`StoreError::Serialization`] for corrupt ones.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::conflict(
                "snapshot",
                format!(
                    "unsupported format version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                    snapshot.format_version
                ),
            ));
        }
        tracing::info!(
            tick = snapshot.tick,
            saved_at = %snapshot.saved_at,
            path = %self.path.display(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }
}
