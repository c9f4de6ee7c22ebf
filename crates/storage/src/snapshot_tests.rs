// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn save_then_load_round_trips_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.zst");

    let mut state = MaterializedState::new();
    state.apply_event(&crate::event::Event::Shutdown);
    let snapshot = Snapshot::new(42, state, Utc::now());

    save(&path, &snapshot).unwrap();

    let registry = MigrationRegistry::new();
    let loaded = load(&path, &registry).unwrap();

    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
}

#[test]
fn save_rotates_previous_snapshot_to_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.zst");

    let first = Snapshot::new(1, MaterializedState::new(), Utc::now());
    save(&path, &first).unwrap();

    let second = Snapshot::new(2, MaterializedState::new(), Utc::now());
    save(&path, &second).unwrap();

    let bak = path.with_extension("bak");
    assert!(bak.exists());

    let registry = MigrationRegistry::new();
    let loaded = load(&path, &registry).unwrap();
    assert_eq!(loaded.seq, 2);
}
