// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-queue: priority task queue (spec §4.2 C2).
//!
//! Wraps the shared [`lugh_storage::Store`] so enqueue/dequeue are each a
//! single critical section — the store's mutex stands in for the
//! `SELECT ... FOR UPDATE SKIP LOCKED` semantics a relational store would
//! give a priority queue for free (spec §4.2 P1).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use lugh_core::{AgentId, ChunkType, ConversationId, PoolTask, PoolTaskId, TaskResultChunk, TaskStatus};
use lugh_storage::{Event, Store, StoreError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("task {0} not found")]
    NotFound(String),
}

/// Per-status task counts (spec §4.2 `get_stats`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub assigned: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// The priority task queue, backed by the shared persisted store.
pub struct Queue {
    store: Arc<Mutex<Store>>,
}

impl Queue {
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    /// Enqueue a new task, persisting it before returning (spec P1: no task
    /// is acknowledged accepted until it is durable).
    pub async fn enqueue(
        &self,
        conversation_id: ConversationId,
        task_type: impl Into<String>,
        priority: u8,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<PoolTaskId, QueueError> {
        let task = PoolTask::new(conversation_id, task_type, priority, payload, now_ms);
        let id = task.id;
        let mut store = self.store.lock().await;
        store.apply(Event::PoolTaskEnqueued { task })?;
        debug!(task_id = %id, priority, "enqueued task");
        Ok(id)
    }

    /// Atomically pick the highest-priority queued task and assign it to
    /// `agent_id`, so two concurrent dequeuers can never claim the same
    /// task (the lock held across select-and-assign is the "skip locked").
    pub async fn dequeue(&self, agent_id: AgentId, now_ms: u64) -> Result<Option<PoolTask>, QueueError> {
        let mut store = self.store.lock().await;
        let Some(task_id) = store.state().queued_tasks_by_priority().first().map(|t| t.id.to_string()) else {
            return Ok(None);
        };

        store.apply(Event::PoolTaskAssigned {
            task_id: task_id.clone(),
            agent_id: agent_id.to_string(),
            at_ms: now_ms,
        })?;
        store.apply(Event::AgentAssigned { agent_id: agent_id.to_string(), task_id: task_id.clone() })?;

        let task = store
            .state()
            .pool_tasks
            .get(&task_id)
            .cloned()
            .ok_or(QueueError::NotFound(task_id))?;
        debug!(task_id = %task.id, agent_id = %agent_id, "dequeued task");
        Ok(Some(task))
    }

    pub async fn complete(&self, task_id: &str, result: serde_json::Value, now_ms: u64) -> Result<(), QueueError> {
        let agent_id = self.assigned_agent(task_id).await;
        let mut store = self.store.lock().await;
        store.apply(Event::PoolTaskCompleted { task_id: task_id.to_string(), result, at_ms: now_ms })?;
        if let Some(agent_id) = agent_id {
            store.apply(Event::AgentFreed { agent_id })?;
        }
        Ok(())
    }

    pub async fn fail(&self, task_id: &str, error: impl Into<String>, now_ms: u64) -> Result<(), QueueError> {
        let agent_id = self.assigned_agent(task_id).await;
        let mut store = self.store.lock().await;
        store.apply(Event::PoolTaskFailed { task_id: task_id.to_string(), error: error.into(), at_ms: now_ms })?;
        if let Some(agent_id) = agent_id {
            store.apply(Event::AgentFreed { agent_id })?;
        }
        Ok(())
    }

    /// Fetch a single task row by id, if it exists.
    pub async fn get(&self, task_id: &str) -> Option<PoolTask> {
        self.store.lock().await.state().pool_tasks.get(task_id).cloned()
    }

    async fn assigned_agent(&self, task_id: &str) -> Option<String> {
        let store = self.store.lock().await;
        store
            .state()
            .pool_tasks
            .get(task_id)
            .and_then(|t| t.assigned_agent_id.as_ref())
            .map(|a| a.to_string())
    }

    /// `assigned -> running`, once a worker has actually started executing
    /// the task (spec §4.2 `mark_running`).
    pub async fn mark_running(&self, task_id: &str) -> Result<(), QueueError> {
        let mut store = self.store.lock().await;
        store.apply(Event::PoolTaskRunning { task_id: task_id.to_string() })?;
        Ok(())
    }

    /// Cancel a task if it hasn't reached a terminal state yet; a no-op for
    /// tasks that are already completed or failed (spec §4.2 `cancel`).
    pub async fn cancel(&self, task_id: &str, reason: impl Into<String>, now_ms: u64) -> Result<(), QueueError> {
        let cancellable = {
            let store = self.store.lock().await;
            matches!(
                store.state().pool_tasks.get(task_id).map(|t| t.status),
                Some(TaskStatus::Queued | TaskStatus::Assigned | TaskStatus::Running)
            )
        };
        if !cancellable {
            return Ok(());
        }
        self.fail(task_id, reason, now_ms).await
    }

    /// Append a streamed chunk of a task's output without changing its
    /// status (spec §4.2 `add_result`).
    pub async fn add_result(
        &self,
        task_id: PoolTaskId,
        sequence: u64,
        chunk_type: ChunkType,
        data: serde_json::Value,
        now_ms: u64,
    ) -> Result<(), QueueError> {
        let chunk = TaskResultChunk { task_id, sequence, chunk_type, data, emitted_at_ms: now_ms };
        let mut store = self.store.lock().await;
        store.apply(Event::PoolTaskResultChunk { chunk })?;
        Ok(())
    }

    /// Every chunk recorded for `task_id`, in emission order (spec §4.2 `get_results`).
    pub async fn get_results(&self, task_id: &str) -> Vec<TaskResultChunk> {
        self.store.lock().await.state().result_chunks.get(task_id).cloned().unwrap_or_default()
    }

    /// Count of tasks in each lifecycle status (spec §4.2 `get_stats`).
    pub async fn get_stats(&self) -> QueueStats {
        let store = self.store.lock().await;
        let mut stats = QueueStats::default();
        for task in store.state().pool_tasks.values() {
            match task.status {
                TaskStatus::Queued => stats.queued += 1,
                TaskStatus::Assigned => stats.assigned += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Reset tasks stuck in `assigned`/`running` for longer than
    /// `max_runtime_s` back to `queued`, freeing whatever agent held them
    /// (spec §4.2 `reassign_stuck`). Returns the number reassigned.
    pub async fn reassign_stuck(&self, max_runtime_s: u64, now_ms: u64) -> Result<usize, QueueError> {
        let max_age_ms = max_runtime_s.saturating_mul(1000);
        let stuck: Vec<(String, Option<String>)> = {
            let store = self.store.lock().await;
            store
                .state()
                .pool_tasks
                .values()
                .filter(|t| matches!(t.status, TaskStatus::Assigned | TaskStatus::Running))
                .filter(|t| t.assigned_at_ms.is_some_and(|at| now_ms.saturating_sub(at) >= max_age_ms))
                .map(|t| (t.id.to_string(), t.assigned_agent_id.as_ref().map(|a| a.to_string())))
                .collect()
        };

        let mut store = self.store.lock().await;
        for (task_id, agent_id) in &stuck {
            warn!(task_id, "reassigning stuck task back to queue");
            store.apply(Event::PoolTaskRequeued { task_id: task_id.clone() })?;
            if let Some(agent_id) = agent_id {
                store.apply(Event::AgentFreed { agent_id: agent_id.clone() })?;
            }
        }
        Ok(stuck.len())
    }

    pub async fn depth(&self) -> usize {
        self.store.lock().await.state().queued_tasks_by_priority().len()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
