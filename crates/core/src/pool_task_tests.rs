// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conversation::ConversationId;

#[test]
fn priority_is_clamped_into_range() {
    assert_eq!(clamp_priority(0), MIN_PRIORITY);
    assert_eq!(clamp_priority(5), 5);
    assert_eq!(clamp_priority(255), MAX_PRIORITY);
}

#[test]
fn new_task_is_queued() {
    let task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000);
    assert_eq!(task.status, TaskStatus::Queued);
    assert!(task.assigned_agent_id.is_none());
    assert!(!task.is_terminal());
}

#[test]
fn assign_then_complete_transitions_status() {
    let mut task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000);
    task.assign(AgentId::new("agent-1"), 1500);
    assert_eq!(task.status, TaskStatus::Assigned);
    assert_eq!(task.assigned_at_ms, Some(1500));

    task.complete(serde_json::json!({"ok": true}), 2000);
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.is_terminal());
}

#[test]
fn mark_running_transitions_from_assigned() {
    let mut task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000);
    task.assign(AgentId::new("agent-1"), 1500);
    task.mark_running();
    assert_eq!(task.status, TaskStatus::Running);
}

#[test]
fn requeue_clears_assignment_and_resets_to_queued() {
    let mut task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000);
    task.assign(AgentId::new("agent-1"), 1500);
    task.mark_running();
    task.requeue();
    assert_eq!(task.status, TaskStatus::Queued);
    assert!(task.assigned_agent_id.is_none());
    assert!(task.assigned_at_ms.is_none());
}

#[test]
fn fail_records_error_and_is_terminal() {
    let mut task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000);
    task.fail("agent crashed", 2000);
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("agent crashed"));
    assert!(task.is_terminal());
}

#[test]
fn chunk_type_display() {
    assert_eq!(ChunkType::Chunk.to_string(), "chunk");
    assert_eq!(ChunkType::ToolCall.to_string(), "tool_call");
    assert_eq!(ChunkType::Complete.to_string(), "complete");
    assert_eq!(ChunkType::Error.to_string(), "error");
}

#[test]
fn serde_round_trip() {
    let task = PoolTask::new(ConversationId::new(), "run_command", 5, serde_json::json!({"cmd": "ls"}), 1000);
    let json = serde_json::to_string(&task).unwrap();
    let back: PoolTask = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, task.id);
    assert_eq!(back.priority, task.priority);
}
