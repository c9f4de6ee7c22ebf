// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn agent_id_display() {
    let id = AgentId::new("worker-1");
    assert_eq!(id.to_string(), "worker-1");
}

#[test]
fn agent_id_equality_against_str() {
    let id = AgentId::new("worker-1");
    assert_eq!(id, "worker-1");
    assert_eq!(id, "worker-1".to_string().as_str());
}

#[test]
fn status_display() {
    assert_eq!(AgentStatus::Idle.to_string(), "idle");
    assert_eq!(AgentStatus::Busy.to_string(), "busy");
    assert_eq!(AgentStatus::Offline.to_string(), "offline");
}

#[test]
fn new_agent_is_idle_with_no_current_task() {
    let agent = Agent::new(AgentId::new("a1"), vec!["shell".into()], 1000);
    assert_eq!(agent.status, AgentStatus::Idle);
    assert!(agent.current_task_id.is_none());
    assert!(agent.invariant_holds());
}

#[test]
fn invariant_detects_inconsistent_busy_without_task() {
    let mut agent = Agent::new(AgentId::new("a1"), vec![], 1000);
    agent.status = AgentStatus::Busy;
    assert!(!agent.invariant_holds());
    agent.current_task_id = Some("t1".into());
    assert!(agent.invariant_holds());
}

#[test]
fn serde_round_trip() {
    let agent = Agent::new(AgentId::new("a1"), vec!["python".into()], 42);
    let json = serde_json::to_string(&agent).unwrap();
    let back: Agent = serde_json::from_str(&json).unwrap();
    assert_eq!(back.agent_id, agent.agent_id);
    assert_eq!(back.status, agent.status);
}
