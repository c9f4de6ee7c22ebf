// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`Event`]s (spec §6.5).
//!
//! Each line is one JSON-encoded entry `{"seq": u64, "event": Event}`. On
//! open, any trailing garbage (a torn write from a crash mid-append) is
//! rotated out to a `.bak` file rather than treated as a fatal error.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An entry persisted to the WAL: a monotonically increasing sequence
/// number paired with the event it records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups. The oldest is evicted when the
/// limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// An append-only log of durable events, backed by a single file.
pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    read_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// sequence number already captured by the last snapshot; entries at or
    /// below it are skipped by [`Self::next_unprocessed`] and
    /// [`Self::entries_after`].
    ///
    /// If a corrupt (non-JSON) line is found, valid entries are rewritten to
    /// a fresh file and the original is rotated to `.bak`.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        let (valid_entries, was_corrupt) = Self::read_valid_entries(path)?;

        if was_corrupt {
            let bak_path = rotate_bak_path(path);
            if path.exists() {
                fs::rename(path, &bak_path)?;
            }
            let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
            for entry in &valid_entries {
                writeln!(file, "{}", serde_json::to_string(entry)?)?;
            }
            file.flush()?;
        }

        let write_seq = valid_entries.last().map(|e| e.seq).unwrap_or(0);
        let file = OpenOptions::new().create(true).read(true).append(true).open(path)?;

        Ok(Self { path: path.to_path_buf(), file, write_seq, processed_seq, read_seq: processed_seq })
    }

    /// Parse every well-formed line, stopping (and flagging corruption) at
    /// the first line that fails to deserialize as a [`WalEntry`] or isn't
    /// valid UTF-8 (a torn write can land mid-byte).
    fn read_valid_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
        if !path.exists() {
            return Ok((Vec::new(), false));
        }
        let raw = fs::read(path)?;
        let mut entries = Vec::new();
        let mut was_corrupt = false;
        for line in raw.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let parsed = std::str::from_utf8(line).ok().and_then(|s| serde_json::from_str::<WalEntry>(s).ok());
            match parsed {
                Some(entry) => entries.push(entry),
                None => {
                    was_corrupt = true;
                    break;
                }
            }
        }
        Ok((entries, was_corrupt))
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append an event, returning its assigned sequence number. Buffered;
    /// call [`Self::flush`] to fsync.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        writeln!(self.file, "{}", serde_json::to_string(&entry)?)?;
        Ok(self.write_seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Mark `seq` as processed into the materialized state, advancing the
    /// read cursor used by [`Self::next_unprocessed`].
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
        self.read_seq = self.read_seq.max(seq);
    }

    /// Read and return the next entry past the read cursor, if any, without
    /// advancing [`Self::processed_seq`] (call [`Self::mark_processed`] once
    /// the caller has durably applied it).
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let entries = self.entries_after(self.read_seq)?;
        if let Some(entry) = entries.into_iter().next() {
            self.read_seq = entry.seq;
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    /// All valid entries with `seq > after`, in order. Stops at the first
    /// corrupt line rather than erroring, matching [`Self::open`]'s
    /// crash-tolerant read.
    pub fn entries_after(&mut self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        self.file.flush()?;
        let (entries, _) = Self::read_valid_entries(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Compact the log file to drop entries with `seq < keep_from`, used
    /// after a snapshot makes them redundant for recovery.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.flush()?;
        let entries = self.entries_after(0)?;
        let retained: Vec<_> = entries.into_iter().filter(|e| e.seq >= keep_from).collect();

        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        for entry in &retained {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        file.flush()?;
        file.sync_data()?;

        self.file = OpenOptions::new().create(true).read(true).append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
