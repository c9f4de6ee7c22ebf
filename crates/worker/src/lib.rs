// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-worker: agent worker process (spec §4.5 C5).
//!
//! One worker handles at most one task at a time: it registers, subscribes
//! to `task_available`/`agent_stop_{id}`/`task_assigned_{id}`, dequeues on
//! notification, runs an assistant session inside the task's resolved
//! `cwd`, forwards streamed events as result chunks, and reports a
//! structured completion summary built from a before/after git diff.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod git_state;
pub mod process_session;
pub mod task_payload;

pub use process_session::ProcessAssistantSession;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lugh_adapters::{AssistantEvent, AssistantSession, SessionError};
use lugh_core::{AgentId, AgentStatus, ChunkType, Clock, ConversationId, PoolTask, PoolTaskId, SystemClock};
use lugh_pubsub::{Handler, HandlerId, PubSub, PubSubError};
use lugh_queue::{Queue, QueueError};
use lugh_recovery::{Outcome, RecoveryContext, RecoveryManager, MAX_ATTEMPTS};
use lugh_registry::{Registry, RegistryError};
use task_payload::{PayloadError, TaskPayload};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    PubSub(#[from] PubSubError),
}

struct RunningTask {
    task_id: String,
    cancel: CancellationToken,
}

/// One worker's in-memory view of its own current task, mirrored onto the
/// registry via `Registry::set_status` (spec invariant: `busy ⇔
/// current_task_id != null`).
pub struct Worker<S: AssistantSession, C: Clock = SystemClock> {
    agent_id: AgentId,
    capabilities: Vec<String>,
    queue: Arc<Queue>,
    registry: Arc<Registry>,
    pubsub: Arc<PubSub>,
    session: Arc<S>,
    recovery: Arc<RecoveryManager>,
    clock: C,
    current: Mutex<Option<RunningTask>>,
    busy: AtomicBool,
    /// `(channel, handler_id)` for every subscription made in `start`, so
    /// `shutdown` can remove only this worker's own handlers — `PubSub`'s
    /// `unsubscribe(channel, None)` would otherwise tear down every handler
    /// on the channel, including siblings sharing the same process.
    subscriptions: Mutex<Vec<(String, HandlerId)>>,
}

impl<S: AssistantSession, C: Clock + 'static> Worker<S, C> {
    pub fn new(
        agent_id: AgentId,
        capabilities: Vec<String>,
        queue: Arc<Queue>,
        registry: Arc<Registry>,
        pubsub: Arc<PubSub>,
        session: Arc<S>,
        recovery: Arc<RecoveryManager>,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self {
            agent_id,
            capabilities,
            queue,
            registry,
            pubsub,
            session,
            recovery,
            clock,
            current: Mutex::new(None),
            busy: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Register, subscribe to the three channels, start the heartbeat
    /// timer, and do an initial work check (spec §4.5 "Lifecycle" step 1-2).
    pub async fn start(self: &Arc<Self>) -> Result<JoinHandle<()>, WorkerError> {
        let now_ms = self.clock.epoch_ms();
        self.registry.register(self.agent_id.clone(), self.capabilities.clone(), now_ms).await?;

        let task_available = "task_available".to_string();
        let agent_stop = format!("agent_stop_{}", self.agent_id);
        let task_assigned = format!("task_assigned_{}", self.agent_id);

        let task_available_id =
            self.pubsub.subscribe(&task_available, Arc::new(TaskAvailableHandler { worker: Arc::clone(self) })).await?;
        let agent_stop_id =
            self.pubsub.subscribe(&agent_stop, Arc::new(AgentStopHandler { worker: Arc::clone(self) })).await?;
        let task_assigned_id =
            self.pubsub.subscribe(&task_assigned, Arc::new(TaskAvailableHandler { worker: Arc::clone(self) })).await?;

        *self.subscriptions.lock().await = vec![
            (task_available, task_available_id),
            (agent_stop, agent_stop_id),
            (task_assigned, task_assigned_id),
        ];

        let heartbeat = Arc::clone(self).spawn_heartbeat_loop();
        self.check_for_work().await;
        Ok(heartbeat)
    }

    /// Graceful shutdown (spec §4.5 "Lifecycle" step 5): stop accepting new
    /// work, unregister, and release pub/sub resources. Does not wait for
    /// an in-flight task to finish.
    pub async fn shutdown(&self, heartbeat: JoinHandle<()>) -> Result<(), WorkerError> {
        heartbeat.abort();
        for (channel, id) in self.subscriptions.lock().await.drain(..) {
            self.pubsub.unsubscribe(&channel, Some(id)).await;
        }
        let now_ms = self.clock.epoch_ms();
        self.registry.set_status(&self.agent_id, AgentStatus::Offline, None, now_ms).await?;
        Ok(())
    }

    /// No-op if a task is already in flight; otherwise dequeues and, on a
    /// hit, spawns the task to completion (spec §4.5 step 2).
    pub async fn check_for_work(self: &Arc<Self>) {
        if self.busy.swap(true, Ordering::AcqRel) {
            return;
        }
        let now_ms = self.clock.epoch_ms();
        match self.queue.dequeue(self.agent_id.clone(), now_ms).await {
            Ok(Some(task)) => {
                let worker = Arc::clone(self);
                tokio::spawn(async move { worker.run_task(task).await });
            }
            Ok(None) => self.busy.store(false, Ordering::Release),
            Err(err) => {
                warn!(%err, "dequeue failed");
                self.busy.store(false, Ordering::Release);
            }
        }
    }

    /// Stop the in-flight task if its id matches (spec §4.5 step 4).
    pub async fn request_stop(&self, task_id: &str) {
        let current = self.current.lock().await;
        if let Some(running) = current.as_ref() {
            if running.task_id == task_id {
                running.cancel.cancel();
            }
        }
    }

    async fn run_task(self: Arc<Self>, task: PoolTask) {
        let task_id = task.id.to_string();
        let conversation_id = task.conversation_id;
        let task_type = task.task_type;
        let priority = task.priority;
        let payload = task.payload;

        let now_ms = self.clock.epoch_ms();
        if let Err(err) = self.registry.set_status(&self.agent_id, AgentStatus::Busy, Some(task_id.clone()), now_ms).await {
            warn!(%err, task_id, "failed to mark agent busy");
        }
        if let Err(err) = self.queue.mark_running(&task_id).await {
            warn!(%err, task_id, "failed to mark task running");
        }

        let cancel = CancellationToken::new();
        *self.current.lock().await = Some(RunningTask { task_id: task_id.clone(), cancel: cancel.clone() });

        let outcome = self.execute(&task_id, payload.clone(), &cancel).await;
        let now_ms = self.clock.epoch_ms();

        match outcome {
            Ok(result) => {
                if let Err(err) = self.queue.complete(&task_id, result, now_ms).await {
                    warn!(%err, task_id, "failed to record task completion");
                }
                self.recovery.clear_history(&recovery_root_id(&payload, &task_id)).await;
            }
            // A cooperative stop (spec §4.5 step 4) is a deliberate abort, not
            // an execution failure Recovery Manager should learn from.
            Err(message) if cancel.is_cancelled() => {
                if let Err(err) = self.queue.fail(&task_id, message, now_ms).await {
                    warn!(%err, task_id, "failed to record task failure");
                }
            }
            Err(message) => {
                self.handle_task_failure(&task_id, &conversation_id, &task_type, priority, &payload, message, now_ms)
                    .await;
            }
        }

        *self.current.lock().await = None;
        if let Err(err) = self.registry.set_status(&self.agent_id, AgentStatus::Idle, None, now_ms).await {
            warn!(%err, "failed to return agent to idle");
        }
        self.busy.store(false, Ordering::Release);
        self.emit_heartbeat().await;
        self.check_for_work().await;
    }

    /// Routes a task execution failure through the Recovery Manager (spec
    /// §4.7/§7 "Retry policy"): below `MAX_ATTEMPTS` the task is failed
    /// terminally and a fresh task carrying the accumulated
    /// `RecoveryContext` is enqueued in its place; at the budget, the
    /// escalation handler (already invoked by `handle_failure` itself) wins
    /// and the task is simply failed.
    async fn handle_task_failure(
        &self,
        task_id: &str,
        conversation_id: &ConversationId,
        task_type: &str,
        priority: u8,
        payload: &serde_json::Value,
        message: String,
        now_ms: u64,
    ) {
        let root_id = recovery_root_id(payload, task_id);
        let description = payload.get("prompt").and_then(|v| v.as_str()).unwrap_or(task_type).to_string();
        let result = serde_json::json!({ "error": message.clone() });

        let outcome = self.recovery.handle_failure(&root_id, &description, Some(self.agent_id.clone()), result, None, now_ms).await;

        match outcome {
            Outcome::Retry(context) => {
                let fail_message =
                    format!("{description} (retrying: attempt {} of {MAX_ATTEMPTS})", context.attempt_number);
                if let Err(err) = self.queue.fail(task_id, fail_message, now_ms).await {
                    warn!(%err, task_id, "failed to record task failure before retry");
                }
                let retry_payload = build_retry_payload(payload, &context, &root_id);
                match self.queue.enqueue(conversation_id.clone(), task_type.to_string(), priority, retry_payload, now_ms).await {
                    Ok(new_task_id) => {
                        info!(task_id, %new_task_id, attempt = context.attempt_number, "retrying failed task with recovery context");
                        if let Err(err) = self
                            .pubsub
                            .publish("task_available", serde_json::json!({ "task_id": new_task_id.to_string() }))
                            .await
                        {
                            warn!(%err, "failed to publish task_available for retry");
                        }
                    }
                    Err(err) => warn!(%err, task_id, "failed to enqueue retry task"),
                }
            }
            Outcome::Escalate(_) => {
                if let Err(err) = self.queue.fail(task_id, message, now_ms).await {
                    warn!(%err, task_id, "failed to record task failure");
                }
            }
        }
    }

    /// Decode the payload, run the assistant session, forward streamed
    /// chunks, and build the completion summary (spec §4.5 "Execution").
    async fn execute(
        &self,
        task_id: &str,
        payload: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, String> {
        let payload = TaskPayload::decode(&payload).map_err(|err: PayloadError| err.to_string())?;

        let before = git_state::snapshot(&payload.cwd).await;
        let mut receiver = self
            .session
            .send_query(&payload.prompt, &payload.cwd, payload.previous_session_handle.as_deref())
            .await
            .map_err(|err: SessionError| err.to_string())?;

        let mut sequence = 0u64;
        let mut activity = git_state::TestActivity::default();
        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err("stopped".to_string()),
                event = receiver.recv() => {
                    let Some(event) = event else { break Err(SessionError::NoResult.to_string()) };
                    activity.observe(&event);
                    if let Some(session_id) = self.forward_chunk(task_id, &mut sequence, event).await {
                        break Ok(session_id);
                    }
                }
            }
        };

        let session_id = result?;
        let after = git_state::snapshot(&payload.cwd).await;
        let mut summary = git_state::diff(&payload.cwd, &before, &after).await;
        activity.apply(&mut summary);
        let mut json = summary.to_json();
        if let serde_json::Value::Object(map) = &mut json {
            map.insert("session_id".to_string(), serde_json::Value::String(session_id));
        }
        Ok(json)
    }

    /// Forward one streamed event as a result chunk; returns the session id
    /// once a `Result` event arrives, ending the stream.
    async fn forward_chunk(&self, task_id: &str, sequence: &mut u64, event: AssistantEvent) -> Option<String> {
        let now_ms = self.clock.epoch_ms();
        let (chunk_type, data, session_id) = match &event {
            AssistantEvent::Assistant { content } => (ChunkType::Chunk, serde_json::json!({ "content": content }), None),
            AssistantEvent::Tool { tool_name, tool_input } => {
                (ChunkType::ToolCall, serde_json::json!({ "tool_name": tool_name, "tool_input": tool_input }), None)
            }
            AssistantEvent::Result { session_id } => (ChunkType::Complete, serde_json::json!({}), Some(session_id.clone())),
        };
        *sequence += 1;
        if let Err(err) = self
            .queue
            .add_result(PoolTaskId::from_string(task_id), *sequence, chunk_type, data, now_ms)
            .await
        {
            warn!(%err, task_id, "failed to record result chunk");
        }
        session_id
    }

    fn spawn_heartbeat_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(env::heartbeat_interval());
            loop {
                ticker.tick().await;
                self.emit_heartbeat().await;
            }
        })
    }

    async fn emit_heartbeat(&self) {
        let now_ms = self.clock.epoch_ms();
        if let Err(err) = self.registry.heartbeat(&self.agent_id, now_ms).await {
            warn!(%err, "heartbeat failed to record");
        }
        let current_task_id = self.current.lock().await.as_ref().map(|t| t.task_id.clone());
        let status = if current_task_id.is_some() { AgentStatus::Busy } else { AgentStatus::Idle };
        let payload = serde_json::json!({
            "agent_id": self.agent_id.to_string(),
            "status": status.to_string(),
            "current_task": current_task_id.map(|id| serde_json::json!({ "id": id })),
            "resources": resources(),
        });
        if let Err(err) = self.pubsub.publish("agent_heartbeat", payload).await {
            debug!(%err, "heartbeat publish failed");
        }
    }
}

/// Best-effort resident memory in MB; CPU usage isn't sampled without an
/// external metrics dependency, so it's reported as 0.0 (spec §4.5
/// heartbeat payload shape is otherwise honored in full).
fn resources() -> serde_json::Value {
    let mem_mb = read_rss_mb().unwrap_or(0);
    serde_json::json!({ "mem_mb": mem_mb, "cpu_percent": 0.0 })
}

#[cfg(target_os = "linux")]
fn read_rss_mb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / 1024)
}

#[cfg(not(target_os = "linux"))]
fn read_rss_mb() -> Option<u64> {
    None
}

/// The logical task id Recovery Manager keys its history on. A retried task
/// gets a fresh `PoolTaskId` (status is monotonic per task row), so the
/// original id is carried forward in the payload to keep attempt counts
/// accumulating across the chain.
fn recovery_root_id(payload: &serde_json::Value, task_id: &str) -> String {
    payload.get("recovery_root_id").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| task_id.to_string())
}

/// Builds the payload for a retried task: the prompt gains the accumulated
/// recovery context, `recovery_root_id` is threaded through so the next
/// failure (if any) keys off the same history, and any prior session handle
/// is dropped so the retry starts a fresh assistant session.
fn build_retry_payload(payload: &serde_json::Value, context: &RecoveryContext, root_id: &str) -> serde_json::Value {
    let mut next = payload.clone();
    if let serde_json::Value::Object(map) = &mut next {
        if let Some(prompt) = map.get("prompt").and_then(|v| v.as_str()).map(str::to_string) {
            map.insert("prompt".to_string(), serde_json::Value::String(augmented_prompt(&prompt, context)));
        }
        map.insert("recovery_root_id".to_string(), serde_json::Value::String(root_id.to_string()));
        map.remove("previous_session_handle");
    }
    next
}

fn augmented_prompt(original: &str, context: &RecoveryContext) -> String {
    let mut text = format!("{original}\n\nRetry attempt {} of {MAX_ATTEMPTS}.", context.attempt_number);
    if !context.recovery_hints.is_empty() {
        text.push_str("\nPrevious attempts ran into:\n");
        for hint in &context.recovery_hints {
            text.push_str(&format!("- {hint}\n"));
        }
    }
    if !context.what_to_avoid.is_empty() {
        text.push_str(&format!("\nAvoid approaches already tried: {}.\n", context.what_to_avoid.join(", ")));
    }
    if !context.failure_patterns.is_empty() {
        text.push_str(&format!("\nRecurring failure pattern(s): {}.\n", context.failure_patterns.join(", ")));
    }
    text
}

struct TaskAvailableHandler<S: AssistantSession, C: Clock> {
    worker: Arc<Worker<S, C>>,
}

#[async_trait]
impl<S: AssistantSession, C: Clock + 'static> Handler for TaskAvailableHandler<S, C> {
    async fn handle(&self, _payload: serde_json::Value) {
        self.worker.check_for_work().await;
    }
}

struct AgentStopHandler<S: AssistantSession, C: Clock> {
    worker: Arc<Worker<S, C>>,
}

#[async_trait]
impl<S: AssistantSession, C: Clock + 'static> Handler for AgentStopHandler<S, C> {
    async fn handle(&self, payload: serde_json::Value) {
        let Some(task_id) = payload.get("task_id").and_then(|v| v.as_str()) else {
            return;
        };
        info!(task_id, "received stop request");
        self.worker.request_stop(task_id).await;
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
