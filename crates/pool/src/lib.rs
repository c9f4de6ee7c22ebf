// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-pool: pool coordinator (spec §4.6 C6).
//!
//! A thin orchestration layer over [`lugh_queue::Queue`] and
//! [`lugh_registry::Registry`], adding the submit/await/stop API and the
//! periodic background sweep that keeps both tables honest. Initialization
//! is idempotent; `submit` before `init` fails.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lugh_core::{Clock, ConversationId, PoolTaskId, SystemClock, TaskStatus, DEFAULT_PRIORITY};
use lugh_pubsub::{PubSub, PubSubError};
use lugh_queue::{Queue, QueueError, QueueStats};
use lugh_registry::{AgentStats, Registry, RegistryError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Interval between cleanup loop sweeps (spec §4.6 "every 30s").
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);
/// Default staleness threshold passed to `prune_stale` by the cleanup loop.
pub const DEFAULT_STALE_THRESHOLD_S: u64 = 120;
/// Default runtime threshold passed to `reassign_stuck` by the cleanup loop.
pub const DEFAULT_TASK_TIMEOUT_S: u64 = 300;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    PubSub(#[from] PubSubError),
    #[error("pool coordinator has not been initialized")]
    NotInitialized,
    #[error("task {0} not found")]
    NotFound(String),
    #[error("task {task_id} failed: {error}")]
    TaskFailed { task_id: String, error: String },
    #[error("timed out waiting for task {0}")]
    TimedOut(String),
}

/// Aggregate agent and task counts (spec §4.6 `status()`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStatus {
    pub agents: AgentStats,
    pub tasks: QueueStats,
}

/// Submit/await/stop API over the task queue and agent registry, plus the
/// background cleanup loop that reclaims stale agents and stuck tasks.
pub struct PoolCoordinator<C: Clock = SystemClock> {
    queue: Arc<Queue>,
    registry: Arc<Registry>,
    pubsub: Arc<PubSub>,
    clock: C,
    initialized: AtomicBool,
}

impl<C: Clock + 'static> PoolCoordinator<C> {
    pub fn new(queue: Arc<Queue>, registry: Arc<Registry>, pubsub: Arc<PubSub>, clock: C) -> Self {
        Self { queue, registry, pubsub, clock, initialized: AtomicBool::new(false) }
    }

    /// Idempotent; a second call just logs a warning (spec §4.6 "double-init
    /// logs a warning").
    pub fn init(&self) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            warn!("pool coordinator already initialized");
        }
    }

    /// Enqueue a task and publish `task_available`. Fails if `init` has not
    /// been called yet.
    pub async fn submit(
        &self,
        conversation_id: ConversationId,
        task_type: impl Into<String>,
        priority: Option<u8>,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<PoolTaskId, PoolError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(PoolError::NotInitialized);
        }
        let task_id = self
            .queue
            .enqueue(conversation_id, task_type, priority.unwrap_or(DEFAULT_PRIORITY), payload, now_ms)
            .await?;
        self.pubsub.publish("task_available", serde_json::json!({ "task_id": task_id.to_string() })).await?;
        Ok(task_id)
    }

    /// Poll the task row until it resolves, fails, or `timeout_ms` elapses.
    pub async fn wait_for_result(&self, task_id: &str, timeout_ms: u64) -> Result<serde_json::Value, PoolError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let task = self.queue.get(task_id).await.ok_or_else(|| PoolError::NotFound(task_id.to_string()))?;
            match task.status {
                TaskStatus::Completed => return Ok(task.result.unwrap_or(serde_json::Value::Null)),
                TaskStatus::Failed => {
                    return Err(PoolError::TaskFailed {
                        task_id: task_id.to_string(),
                        error: task.error.unwrap_or_default(),
                    })
                }
                TaskStatus::Queued | TaskStatus::Assigned | TaskStatus::Running => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PoolError::TimedOut(task_id.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Ask the assigned agent (if any) to stop, then cancel the task row
    /// (spec §4.6 `stop`).
    pub async fn stop(&self, task_id: &str, now_ms: u64) -> Result<(), PoolError> {
        if let Some(task) = self.queue.get(task_id).await {
            if let Some(agent_id) = &task.assigned_agent_id {
                let channel = format!("agent_stop_{agent_id}");
                self.pubsub.publish(&channel, serde_json::json!({ "task_id": task_id })).await?;
            }
        }
        self.queue.cancel(task_id, "stopped by coordinator", now_ms).await?;
        Ok(())
    }

    /// Aggregate agent and task counts.
    pub async fn status(&self) -> PoolStatus {
        PoolStatus { agents: self.registry.get_stats().await, tasks: self.queue.get_stats().await }
    }

    /// Spawn the periodic cleanup sweep: every [`CLEANUP_INTERVAL`], prune
    /// stale agents and reassign stuck tasks (spec §4.6 "background loop").
    pub fn spawn_background_loop(self: Arc<Self>, stale_threshold_s: u64, task_timeout_s: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                ticker.tick().await;
                let now_ms = self.clock.epoch_ms();

                match self.registry.prune_stale(stale_threshold_s, now_ms).await {
                    Ok(pruned) if !pruned.is_empty() => debug!(count = pruned.len(), "pruned stale agents"),
                    Ok(_) => {}
                    Err(err) => warn!(%err, "prune_stale failed"),
                }

                match self.queue.reassign_stuck(task_timeout_s, now_ms).await {
                    Ok(n) if n > 0 => debug!(count = n, "reassigned stuck tasks"),
                    Ok(_) => {}
                    Err(err) => warn!(%err, "reassign_stuck failed"),
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
