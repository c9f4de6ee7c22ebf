// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool task and result chunk types (spec §3 "Pool Task", "Task Result Chunk", §4.6 C6).

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::conversation::ConversationId;

crate::define_id! {
    /// Internal identifier for a Pool Task row.
    pub struct PoolTaskId("ptsk");
}

/// Lifecycle state of a queued pool task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Assigned,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    TaskStatus {
        Queued => "queued",
        Assigned => "assigned",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Lowest valid priority value and highest urgency: priority 1 always
/// precedes priority 10 in dequeue order, regardless of age (spec §4.2).
pub const MIN_PRIORITY: u8 = 1;
/// Highest valid priority value, lowest urgency.
pub const MAX_PRIORITY: u8 = 10;
/// Priority assigned when a caller does not specify one (spec §4.2 C2 enqueue).
pub const DEFAULT_PRIORITY: u8 = 5;

/// Clamp a requested priority into the valid `[MIN_PRIORITY, MAX_PRIORITY]` range.
pub fn clamp_priority(priority: u8) -> u8 {
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// A unit of work dispatched to the agent pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolTask {
    pub id: PoolTaskId,
    pub conversation_id: ConversationId,
    pub task_type: String,
    pub priority: u8,
    pub status: TaskStatus,
    pub payload: serde_json::Value,
    pub assigned_agent_id: Option<AgentId>,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at_ms: u64,
    pub assigned_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
}

impl PoolTask {
    pub fn new(
        conversation_id: ConversationId,
        task_type: impl Into<String>,
        priority: u8,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Self {
        Self {
            id: PoolTaskId::new(),
            conversation_id,
            task_type: task_type.into(),
            priority: clamp_priority(priority),
            status: TaskStatus::Queued,
            payload,
            assigned_agent_id: None,
            error: None,
            result: None,
            created_at_ms: now_ms,
            assigned_at_ms: None,
            completed_at_ms: None,
        }
    }

    pub fn assign(&mut self, agent_id: AgentId, now_ms: u64) {
        self.status = TaskStatus::Assigned;
        self.assigned_agent_id = Some(agent_id);
        self.assigned_at_ms = Some(now_ms);
    }

    pub fn complete(&mut self, result: serde_json::Value, now_ms: u64) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.completed_at_ms = Some(now_ms);
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) {
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.completed_at_ms = Some(now_ms);
    }

    /// `assigned → running` (spec §4.2 `mark_running`).
    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
    }

    /// Reset a stuck `assigned`/`running` task back to `queued`, clearing
    /// its assignment (spec §4.2 `reassign_stuck`).
    pub fn requeue(&mut self) {
        self.status = TaskStatus::Queued;
        self.assigned_agent_id = None;
        self.assigned_at_ms = None;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// The kind of streamed result chunk a worker publishes while executing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Chunk,
    ToolCall,
    Complete,
    Error,
}

crate::simple_display! {
    ChunkType {
        Chunk => "chunk",
        ToolCall => "tool_call",
        Complete => "complete",
        Error => "error",
    }
}

/// One streamed piece of a task's output, published incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultChunk {
    pub task_id: PoolTaskId,
    pub sequence: u64,
    pub chunk_type: ChunkType,
    pub data: serde_json::Value,
    pub emitted_at_ms: u64,
}

#[cfg(test)]
#[path = "pool_task_tests.rs"]
mod tests;
