// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot captures the complete materialized state at a point in time,
//! identified by the WAL sequence number it was taken at. Recovery loads the
//! latest snapshot and replays WAL entries after that sequence.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::migration::{MigrationError, MigrationRegistry};
use crate::state::MaterializedState;
use crate::wal::rotate_bak_path;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// A snapshot of the materialized state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number captured by this snapshot.
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at: DateTime<Utc>) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at }
    }
}

/// Write `snapshot` to `path`, zstd-compressed. Any existing file at `path`
/// is rotated to `.bak` first.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec(snapshot)?;
    let compressed = zstd::encode_all(json.as_slice(), 0)?;

    if path.exists() {
        let bak_path = rotate_bak_path(path);
        fs::rename(path, &bak_path)?;
    }

    let mut file = File::create(path)?;
    file.write_all(&compressed)?;
    file.sync_all()?;
    Ok(())
}

/// Load and decompress the snapshot at `path`, migrating it to
/// [`CURRENT_SNAPSHOT_VERSION`] if it was written by an older schema.
pub fn load(path: &Path, migrations: &MigrationRegistry) -> Result<Snapshot, SnapshotError> {
    let mut file = File::open(path)?;
    let mut compressed = Vec::new();
    file.read_to_end(&mut compressed)?;

    let json = zstd::decode_all(compressed.as_slice())?;
    let raw: serde_json::Value = serde_json::from_slice(&json)?;
    let migrated = migrations.migrate_to(raw, CURRENT_SNAPSHOT_VERSION)?;
    Ok(serde_json::from_value(migrated)?)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
