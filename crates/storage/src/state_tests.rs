// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lugh_core::{Agent, AgentId, ConversationId, ConversationKey, PlatformType};

fn conversation() -> Conversation {
    Conversation::new(ConversationKey::new(PlatformType::Slack, "C1"), "claude-code", 1000)
}

#[test]
fn conversation_created_is_idempotent() {
    let mut state = MaterializedState::new();
    let conv = conversation();
    let event = Event::ConversationCreated { conversation: conv.clone() };
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.conversations.len(), 1);
}

#[test]
fn session_created_deactivates_prior_active_session_for_conversation() {
    let mut state = MaterializedState::new();
    let conv_id = ConversationId::new();

    let first = Session::new(conv_id, "claude-code", 1000);
    state.apply_event(&Event::SessionCreated { session: first.clone() });

    let second = Session::new(conv_id, "claude-code", 2000);
    state.apply_event(&Event::SessionCreated { session: second.clone() });

    assert!(!state.sessions[&first.id.to_string()].active);
    assert!(state.sessions[&second.id.to_string()].active);
}

#[test]
fn agent_assign_and_free_round_trip_invariant() {
    let mut state = MaterializedState::new();
    let agent = Agent::new(AgentId::new("a1"), vec!["shell".into()], 1000);
    state.apply_event(&Event::AgentRegistered { agent: agent.clone() });

    state.apply_event(&Event::AgentAssigned { agent_id: "a1".into(), task_id: "t1".into() });
    let busy = &state.agents["a1"];
    assert!(busy.invariant_holds());
    assert_eq!(busy.current_task_id.as_deref(), Some("t1"));

    state.apply_event(&Event::AgentFreed { agent_id: "a1".into() });
    let idle = &state.agents["a1"];
    assert!(idle.invariant_holds());
    assert!(idle.current_task_id.is_none());
}

#[test]
fn queued_tasks_sorted_by_priority_then_age() {
    use lugh_core::PoolTask;

    let mut state = MaterializedState::new();
    let conv_id = ConversationId::new();
    // Priority 1 always precedes priority 10 regardless of age (spec §4.2).
    let urgent = PoolTask::new(conv_id, "run", 2, serde_json::json!({}), 1000);
    let later_low_priority = PoolTask::new(conv_id, "run", 9, serde_json::json!({}), 2000);
    let earlier_low_priority = PoolTask::new(conv_id, "run", 9, serde_json::json!({}), 1500);

    for task in [urgent.clone(), later_low_priority.clone(), earlier_low_priority.clone()] {
        state.apply_event(&Event::PoolTaskEnqueued { task });
    }

    let ordered = state.queued_tasks_by_priority();
    assert_eq!(ordered[0].id, urgent.id);
    assert_eq!(ordered[1].id, earlier_low_priority.id);
    assert_eq!(ordered[2].id, later_low_priority.id);
}

#[test]
fn pool_task_running_then_requeued_round_trips_through_queued() {
    use lugh_core::PoolTask;

    let mut state = MaterializedState::new();
    let conv_id = ConversationId::new();
    let task = PoolTask::new(conv_id, "run", 5, serde_json::json!({}), 1000);
    let task_id = task.id.to_string();
    state.apply_event(&Event::PoolTaskEnqueued { task });
    state.apply_event(&Event::PoolTaskAssigned {
        task_id: task_id.clone(),
        agent_id: "a1".into(),
        at_ms: 1500,
    });

    state.apply_event(&Event::PoolTaskRunning { task_id: task_id.clone() });
    assert_eq!(state.pool_tasks[&task_id].status, lugh_core::TaskStatus::Running);

    state.apply_event(&Event::PoolTaskRequeued { task_id: task_id.clone() });
    let requeued = &state.pool_tasks[&task_id];
    assert_eq!(requeued.status, lugh_core::TaskStatus::Queued);
    assert!(requeued.assigned_agent_id.is_none());
}

#[test]
fn result_chunks_persist_past_task_completion() {
    use lugh_core::{ChunkType, PoolTask, TaskResultChunk};

    let mut state = MaterializedState::new();
    let conv_id = ConversationId::new();
    let task = PoolTask::new(conv_id, "run", 5, serde_json::json!({}), 1000);
    let task_id = task.id;
    state.apply_event(&Event::PoolTaskEnqueued { task });

    let chunk = TaskResultChunk {
        task_id,
        sequence: 0,
        chunk_type: ChunkType::Chunk,
        data: serde_json::json!({"text": "hi"}),
        emitted_at_ms: 1100,
    };
    state.apply_event(&Event::PoolTaskResultChunk { chunk });
    state.apply_event(&Event::PoolTaskCompleted {
        task_id: task_id.to_string(),
        result: serde_json::json!({"ok": true}),
        at_ms: 1200,
    });

    assert_eq!(state.result_chunks[&task_id.to_string()].len(), 1);
}

#[test]
fn find_active_env_ignores_destroyed_rows() {
    use lugh_core::{CodebaseId, IsolationEnv, IsolationKey, WorkflowType};

    let mut state = MaterializedState::new();
    let key = IsolationKey::new(CodebaseId::new(), WorkflowType::Issue, "42");
    let env = IsolationEnv::new(key.clone(), "git_worktree", "/w/issue-42", "issue-42", "github", 1000);
    let env_id = env.id.to_string();
    state.apply_event(&Event::IsolationEnvCreated { env });
    assert!(state.find_active_env(&key).is_some());

    state.apply_event(&Event::IsolationEnvDestroyed { env_id, at_ms: 2000 });
    assert!(state.find_active_env(&key).is_none());
}

#[test]
fn shutdown_event_does_not_touch_state() {
    let mut state = MaterializedState::new();
    state.apply_event(&Event::Shutdown);
    assert!(state.conversations.is_empty());
}
