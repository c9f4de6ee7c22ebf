// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lugh_core::{Agent, AgentId};
use tempfile::tempdir;

#[test]
fn apply_persists_state_visible_immediately() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();

    let agent = Agent::new(AgentId::new("a1"), vec![], 1000);
    store.apply(Event::AgentRegistered { agent }).unwrap();

    assert!(store.state().agents.contains_key("a1"));
}

#[test]
fn reopen_replays_wal_without_snapshot() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        let agent = Agent::new(AgentId::new("a1"), vec![], 1000);
        store.apply(Event::AgentRegistered { agent }).unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert!(store.state().agents.contains_key("a1"));
}

#[test]
fn snapshot_now_then_reopen_restores_from_snapshot() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        let agent = Agent::new(AgentId::new("a1"), vec![], 1000);
        store.apply(Event::AgentRegistered { agent }).unwrap();
        store.snapshot_now().unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert!(store.state().agents.contains_key("a1"));
}

#[test]
fn reopen_after_snapshot_and_further_writes_replays_only_the_tail() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        let a1 = Agent::new(AgentId::new("a1"), vec![], 1000);
        store.apply(Event::AgentRegistered { agent: a1 }).unwrap();
        store.snapshot_now().unwrap();

        let a2 = Agent::new(AgentId::new("a2"), vec![], 2000);
        store.apply(Event::AgentRegistered { agent: a2 }).unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert!(store.state().agents.contains_key("a1"));
    assert!(store.state().agents.contains_key("a2"));
}
