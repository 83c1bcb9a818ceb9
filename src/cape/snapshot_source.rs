//! `SnapshotSource` — the re-architected form of CAPE's snapshot access
//! (spec.md §9 "Ambient snapshot access").
//!
//! The original form reads an environment-variable path on every call; here
//! it is a capability injected by construction so tests can supply a fake
//! without touching the filesystem.

use crate::snapshot::{self, Snapshot, SnapshotError};
use std::path::PathBuf;

/// A source of the current carbon snapshot.
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> Result<Snapshot, SnapshotError>;
}

/// Reads the snapshot from a file path on every call (spec.md §5: "no
/// in-memory cache between decisions is required, the file read is
/// cheap").
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn load(&self) -> Result<Snapshot, SnapshotError> {
        snapshot::load(&self.path)
    }
}

#[cfg(test)]
pub struct FixedSnapshotSource {
    pub result: std::sync::Mutex<Result<Snapshot, String>>,
}

#[cfg(test)]
impl SnapshotSource for FixedSnapshotSource {
    fn load(&self) -> Result<Snapshot, SnapshotError> {
        match &*self.result.lock().unwrap() {
            Ok(snap) => Ok(snap.clone()),
            Err(msg) => Err(SnapshotError::Schema {
                path: PathBuf::from("fixture"),
                reason: msg.clone(),
            }),
        }
    }
}
