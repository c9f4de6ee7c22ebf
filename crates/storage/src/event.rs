// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable events recorded to the write-ahead log (spec §6.5).
//!
//! Every mutation to a persisted table is recorded as an `Event` before the
//! in-memory [`crate::state::MaterializedState`] is updated, so recovery can
//! rebuild state by replaying the log from the last snapshot.

use std::collections::HashMap;

use lugh_core::{
    Agent, Approval, Codebase, Conversation, IsolationEnv, PoolTask, Session, TaskResultChunk, Template,
};
use serde::{Deserialize, Serialize};

/// A fact recorded to the WAL. Handlers in [`crate::state`] derive all
/// in-memory state from a replay of these events; they carry no side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ConversationCreated { conversation: Conversation },
    ConversationTouched { conversation_id: String, at_ms: u64 },
    /// Binds a conversation to the Codebase it was `/clone`d or routed into
    /// (spec §4.8 step 1, Scenario 1). `None` unbinds it (`/repo-remove`).
    ConversationCodebaseSet { conversation_id: String, codebase_id: Option<String> },
    /// Spec §4.8 step 5: persist `(isolation_env_id, cwd)` on the
    /// conversation; `None` clears the reference (invariant P3).
    ConversationIsolationSet { conversation_id: String, isolation_env_id: Option<String> },
    /// Upserts a single key in a conversation's free-form metadata map, e.g.
    /// `/setcwd`'s override or `/verbose`'s toggle.
    ConversationMetadataSet { conversation_id: String, key: String, value: serde_json::Value },

    SessionCreated { session: Session },
    SessionUpdated { session: Session },
    SessionDeactivated { session_id: String, at_ms: u64 },

    CodebaseRegistered { codebase: Codebase },
    /// `/load-commands`, or the auto-load on `/clone` (Scenario 1).
    CodebaseCommandsSet { codebase_id: String, commands: HashMap<String, String> },

    IsolationEnvCreated { env: IsolationEnv },
    IsolationEnvDestroyed { env_id: String, at_ms: u64 },

    TemplateUpserted { template: Template },
    TemplateDeleted { name: String },

    ApprovalRecorded { approval: Approval },

    AgentRegistered { agent: Agent },
    AgentHeartbeat { agent_id: String, at_ms: u64 },
    AgentAssigned { agent_id: String, task_id: String },
    AgentFreed { agent_id: String },
    AgentOffline { agent_id: String },

    PoolTaskEnqueued { task: PoolTask },
    PoolTaskAssigned { task_id: String, agent_id: String, at_ms: u64 },
    PoolTaskRunning { task_id: String },
    PoolTaskCompleted { task_id: String, result: serde_json::Value, at_ms: u64 },
    PoolTaskFailed { task_id: String, error: String, at_ms: u64 },
    /// Reset a stuck `assigned`/`running` task back to `queued` (spec §4.2 `reassign_stuck`).
    PoolTaskRequeued { task_id: String },
    PoolTaskResultChunk { chunk: TaskResultChunk },

    /// Control event: written so a replaying reader can stop without treating
    /// end-of-file as corruption. Never mutates state.
    Shutdown,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
