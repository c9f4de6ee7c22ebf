// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

async fn new_registry() -> (Registry, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (Registry::new(Arc::new(Mutex::new(store))), dir)
}

#[tokio::test]
async fn register_then_available_lists_it_idle() {
    let (registry, _dir) = new_registry().await;
    registry.register(AgentId::new("a1"), vec!["git".into()], 1000).await.unwrap();

    let available = registry.get_available().await;
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].agent_id, AgentId::new("a1"));
    assert_eq!(available[0].status, AgentStatus::Idle);
}

#[tokio::test]
async fn reregistering_resets_status_to_idle() {
    let (registry, _dir) = new_registry().await;
    let agent_id = AgentId::new("a1");
    registry.register(agent_id.clone(), vec![], 1000).await.unwrap();
    registry.set_status(&agent_id, AgentStatus::Busy, Some("t1".into()), 1500).await.unwrap();

    registry.register(agent_id.clone(), vec![], 2000).await.unwrap();

    let store = registry.store.lock().await;
    let agent = &store.state().agents["a1"];
    assert_eq!(agent.status, AgentStatus::Idle);
    assert!(agent.current_task_id.is_none());
}

#[tokio::test]
async fn heartbeat_from_unknown_agent_does_not_error() {
    let (registry, _dir) = new_registry().await;
    registry.heartbeat(&AgentId::new("ghost"), 1000).await.unwrap();
}

#[tokio::test]
async fn set_status_idle_clears_current_task() {
    let (registry, _dir) = new_registry().await;
    let agent_id = AgentId::new("a1");
    registry.register(agent_id.clone(), vec![], 1000).await.unwrap();
    registry.set_status(&agent_id, AgentStatus::Busy, Some("t1".into()), 1100).await.unwrap();
    registry.set_status(&agent_id, AgentStatus::Idle, None, 1200).await.unwrap();

    let store = registry.store.lock().await;
    let agent = &store.state().agents["a1"];
    assert!(agent.invariant_holds());
    assert_eq!(agent.status, AgentStatus::Idle);
    assert!(agent.current_task_id.is_none());
}

#[tokio::test]
async fn prune_stale_offlines_agents_past_threshold_and_clears_task() {
    let (registry, _dir) = new_registry().await;
    let stale_id = AgentId::new("stale");
    let fresh_id = AgentId::new("fresh");
    registry.register(stale_id.clone(), vec![], 1000).await.unwrap();
    registry.register(fresh_id.clone(), vec![], 1000).await.unwrap();
    registry.set_status(&stale_id, AgentStatus::Busy, Some("t1".into()), 1000).await.unwrap();
    registry.heartbeat(&fresh_id, 59_000).await.unwrap();

    let pruned = registry.prune_stale(30, 60_000).await.unwrap();

    assert_eq!(pruned, vec![stale_id.clone()]);
    let store = registry.store.lock().await;
    let agent = &store.state().agents["stale"];
    assert_eq!(agent.status, AgentStatus::Offline);
    assert!(agent.current_task_id.is_none());
    let fresh = &store.state().agents["fresh"];
    assert_eq!(fresh.status, AgentStatus::Idle);
}

#[tokio::test]
async fn get_stats_counts_agents_by_status() {
    let (registry, _dir) = new_registry().await;
    registry.register(AgentId::new("a1"), vec![], 1000).await.unwrap();
    registry.register(AgentId::new("a2"), vec![], 1000).await.unwrap();
    registry.register(AgentId::new("a3"), vec![], 1000).await.unwrap();
    registry.set_status(&AgentId::new("a2"), AgentStatus::Busy, Some("t1".into()), 1100).await.unwrap();
    registry.set_status(&AgentId::new("a3"), AgentStatus::Offline, None, 1100).await.unwrap();

    let stats = registry.get_stats().await;
    assert_eq!(stats, AgentStats { total: 3, idle: 1, busy: 1, offline: 1 });
}

#[tokio::test]
async fn get_available_orders_most_recent_heartbeat_first() {
    let (registry, _dir) = new_registry().await;
    registry.register(AgentId::new("a1"), vec![], 1000).await.unwrap();
    registry.register(AgentId::new("a2"), vec![], 1000).await.unwrap();
    registry.heartbeat(&AgentId::new("a2"), 5000).await.unwrap();

    let available = registry.get_available().await;
    assert_eq!(available[0].agent_id, AgentId::new("a2"));
    assert_eq!(available[1].agent_id, AgentId::new("a1"));
}
