// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted store: WAL + periodic snapshot + materialized state
//! (spec §6.5).
//!
//! Every write goes through [`Store::apply`], which appends the event to the
//! WAL, applies it to the in-memory state, and fsyncs the WAL before
//! returning, so nothing reported back to a caller is ever only in memory.
//! [`Store::open`] replays the WAL on top of the latest snapshot to rebuild
//! state after a restart.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::event::Event;
use crate::migration::MigrationRegistry;
use crate::snapshot::{self, Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// WAL sequence interval between automatic snapshots.
const SNAPSHOT_INTERVAL: u64 = 1000;

fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("lugh.wal")
}

fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join("lugh.snapshot.zst")
}

/// The orchestration core's durable store: one WAL plus its materialized
/// state, rooted at a data directory.
pub struct Store {
    data_dir: PathBuf,
    wal: Wal,
    state: MaterializedState,
}

impl Store {
    /// Open the store at `data_dir`, creating it if absent. Loads the
    /// latest snapshot (if any) then replays WAL entries recorded after it.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let migrations = MigrationRegistry::new();

        let snap_path = snapshot_path(data_dir);
        let (mut state, processed_seq) = if snap_path.exists() {
            let snapshot = snapshot::load(&snap_path, &migrations)?;
            info!(seq = snapshot.seq, "loaded snapshot");
            (snapshot.state, snapshot.seq)
        } else {
            (MaterializedState::new(), 0)
        };

        let mut wal = Wal::open(&wal_path(data_dir), processed_seq)?;
        let mut replayed = 0;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        if replayed > 0 {
            info!(replayed, "replayed WAL entries on open");
        }

        Ok(Self { data_dir: data_dir.to_path_buf(), wal, state })
    }

    pub fn state(&self) -> &MaterializedState {
        &self.state
    }

    /// Record `event` to the WAL, apply it to in-memory state, and fsync
    /// before returning — every mutation visible via the API must be
    /// durable before the caller sees `Ok` (spec §6.5). Also snapshots and
    /// compacts the WAL once the snapshot interval has been crossed.
    pub fn apply(&mut self, event: Event) -> Result<u64, StoreError> {
        let seq = self.wal.append(&event)?;
        self.state.apply_event(&event);
        self.wal.mark_processed(seq);
        self.wal.flush()?;

        if seq % SNAPSHOT_INTERVAL == 0 {
            self.snapshot_and_compact(seq)?;
        }
        Ok(seq)
    }

    /// Force a snapshot at the current sequence and compact the WAL, even if
    /// the automatic interval hasn't elapsed. Used on graceful shutdown.
    pub fn snapshot_now(&mut self) -> Result<(), StoreError> {
        self.wal.flush()?;
        self.snapshot_and_compact(self.wal.write_seq())
    }

    fn snapshot_and_compact(&mut self, seq: u64) -> Result<(), StoreError> {
        let snapshot = Snapshot::new(seq, self.state.clone(), Utc::now());
        match snapshot::save(&snapshot_path(&self.data_dir), &snapshot) {
            Ok(()) => {
                self.wal.truncate_before(seq + 1)?;
                info!(seq, "snapshotted and compacted WAL");
            }
            Err(err) => {
                warn!(%err, "snapshot failed; WAL retained uncompacted");
                return Err(err.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
