// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from WAL replay (spec §6.5).
//!
//! All handlers here must be idempotent: applying the same event twice must
//! produce the same state as applying it once, since events are replayed
//! both for immediate visibility and again during recovery.

use std::collections::HashMap;

use lugh_core::{
    Agent, AgentStatus, Approval, Codebase, Conversation, ConversationKey, IsolationEnv, IsolationKey, PoolTask,
    Session, TaskResultChunk, TaskStatus, Template,
};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// The complete in-memory state of the orchestration core, rebuilt from the
/// WAL and periodically snapshotted to disk.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub conversations: HashMap<String, Conversation>,
    pub sessions: HashMap<String, Session>,
    pub codebases: HashMap<String, Codebase>,
    pub isolation_envs: HashMap<String, IsolationEnv>,
    pub agents: HashMap<String, Agent>,
    pub pool_tasks: HashMap<String, PoolTask>,
    /// Streamed result chunks, keyed by task id, in insertion order. Kept for
    /// the lifetime of the task so `get_results` can retrieve them at any
    /// point, not only while the task is in-flight (spec §4.2 `get_results`).
    #[serde(default)]
    pub result_chunks: HashMap<String, Vec<TaskResultChunk>>,
    /// Keyed by name, not a generated id — registration is an upsert
    /// (spec §6.3 `template-add`).
    #[serde(default)]
    pub templates: HashMap<String, Template>,
    #[serde(default)]
    pub approvals: HashMap<String, Approval>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active (non-destroyed) isolation environments matching a codebase.
    pub fn active_envs_for_codebase<'a>(
        &'a self,
        codebase_id: &'a str,
    ) -> impl Iterator<Item = &'a IsolationEnv> + 'a {
        self.isolation_envs
            .values()
            .filter(move |env| env.key.codebase_id.as_str() == codebase_id && env.is_active())
    }

    /// Queued tasks ordered `priority ASC, created_at ASC` — priority 1
    /// always precedes priority 10 regardless of age (spec §4.2 C2 ordering).
    pub fn queued_tasks_by_priority(&self) -> Vec<&PoolTask> {
        let mut queued: Vec<&PoolTask> = self
            .pool_tasks
            .values()
            .filter(|t| t.status == TaskStatus::Queued)
            .collect();
        queued.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at_ms.cmp(&b.created_at_ms)));
        queued
    }

    /// The active env matching `key`, if any (spec §4.4 step 2 reuse-by-identity).
    pub fn find_active_env(&self, key: &IsolationKey) -> Option<&IsolationEnv> {
        self.isolation_envs.values().find(|env| &env.key == key && env.is_active())
    }

    pub fn idle_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(|a| a.status == AgentStatus::Idle)
    }

    /// Codebase whose `name` (`owner/repo`) matches, if registered (spec
    /// Scenario 1: re-`/clone`ing the same remote must not create a
    /// second row).
    pub fn find_codebase_by_name(&self, name: &str) -> Option<&Codebase> {
        self.codebases.values().find(|c| c.name == name)
    }

    /// Conversation whose external `(platform_type, platform_conversation_id)`
    /// key matches, if one has already been created for it (spec §4.8 step 1).
    pub fn find_conversation_by_key(&self, key: &ConversationKey) -> Option<&Conversation> {
        self.conversations.values().find(|c| &c.key == key)
    }

    /// The conversation's currently active session, if any (invariant P2: at
    /// most one row per conversation has `active == true`).
    pub fn active_session_for(&self, conversation_id: &str) -> Option<&Session> {
        self.sessions.values().find(|s| s.conversation_id.as_str() == conversation_id && s.active)
    }

    /// Apply an event, mutating this state in place.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::ConversationCreated { conversation } => {
                self.conversations
                    .entry(conversation.id.to_string())
                    .or_insert_with(|| conversation.clone());
            }
            Event::ConversationTouched { conversation_id, at_ms } => {
                if let Some(conv) = self.conversations.get_mut(conversation_id) {
                    conv.touch(*at_ms);
                }
            }
            Event::ConversationCodebaseSet { conversation_id, codebase_id } => {
                if let Some(conv) = self.conversations.get_mut(conversation_id) {
                    conv.codebase_id = codebase_id.as_deref().map(|id| id.into());
                }
            }
            Event::ConversationIsolationSet { conversation_id, isolation_env_id } => {
                if let Some(conv) = self.conversations.get_mut(conversation_id) {
                    conv.isolation_env_id = isolation_env_id.clone();
                }
            }
            Event::ConversationMetadataSet { conversation_id, key, value } => {
                if let Some(conv) = self.conversations.get_mut(conversation_id) {
                    conv.metadata.insert(key.clone(), value.clone());
                }
            }

            Event::SessionCreated { session } | Event::SessionUpdated { session } => {
                if session.active {
                    for other in self.sessions.values_mut() {
                        if other.conversation_id == session.conversation_id && other.id != session.id {
                            other.active = false;
                        }
                    }
                }
                self.sessions.insert(session.id.to_string(), session.clone());
            }
            Event::SessionDeactivated { session_id, at_ms } => {
                if let Some(session) = self.sessions.get_mut(session_id) {
                    session.active = false;
                    session.last_activity_at_ms = *at_ms;
                }
            }

            Event::CodebaseRegistered { codebase } => {
                self.codebases.entry(codebase.id.to_string()).or_insert_with(|| codebase.clone());
            }
            Event::CodebaseCommandsSet { codebase_id, commands } => {
                if let Some(codebase) = self.codebases.get_mut(codebase_id) {
                    codebase.commands = commands.clone();
                }
            }

            Event::IsolationEnvCreated { env } => {
                self.isolation_envs.entry(env.id.to_string()).or_insert_with(|| env.clone());
            }
            Event::IsolationEnvDestroyed { env_id, at_ms } => {
                if let Some(env) = self.isolation_envs.get_mut(env_id) {
                    env.destroy(*at_ms);
                }
            }

            Event::TemplateUpserted { template } => {
                self.templates.insert(template.name.clone(), template.clone());
            }
            Event::TemplateDeleted { name } => {
                self.templates.remove(name);
            }

            Event::ApprovalRecorded { approval } => {
                self.approvals.insert(approval.id.to_string(), approval.clone());
            }

            Event::AgentRegistered { agent } => {
                self.agents.insert(agent.agent_id.to_string(), agent.clone());
            }
            Event::AgentHeartbeat { agent_id, at_ms } => {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    agent.last_heartbeat_ms = *at_ms;
                }
            }
            Event::AgentAssigned { agent_id, task_id } => {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    agent.status = AgentStatus::Busy;
                    agent.current_task_id = Some(task_id.clone());
                }
            }
            Event::AgentFreed { agent_id } => {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    agent.status = AgentStatus::Idle;
                    agent.current_task_id = None;
                }
            }
            Event::AgentOffline { agent_id } => {
                if let Some(agent) = self.agents.get_mut(agent_id) {
                    agent.status = AgentStatus::Offline;
                    agent.current_task_id = None;
                }
            }

            Event::PoolTaskEnqueued { task } => {
                self.pool_tasks.entry(task.id.to_string()).or_insert_with(|| task.clone());
            }
            Event::PoolTaskAssigned { task_id, agent_id, at_ms } => {
                if let Some(task) = self.pool_tasks.get_mut(task_id) {
                    task.assign(agent_id.as_str().into(), *at_ms);
                }
            }
            Event::PoolTaskRunning { task_id } => {
                if let Some(task) = self.pool_tasks.get_mut(task_id) {
                    task.mark_running();
                }
            }
            Event::PoolTaskCompleted { task_id, result, at_ms } => {
                if let Some(task) = self.pool_tasks.get_mut(task_id) {
                    task.complete(result.clone(), *at_ms);
                }
            }
            Event::PoolTaskFailed { task_id, error, at_ms } => {
                if let Some(task) = self.pool_tasks.get_mut(task_id) {
                    task.fail(error.clone(), *at_ms);
                }
            }
            Event::PoolTaskRequeued { task_id } => {
                if let Some(task) = self.pool_tasks.get_mut(task_id) {
                    task.requeue();
                }
            }
            Event::PoolTaskResultChunk { chunk } => {
                self.result_chunks.entry(chunk.task_id.to_string()).or_default().push(chunk.clone());
            }

            Event::Shutdown => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
