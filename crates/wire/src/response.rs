// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response types returned over the wire in reply to a [`crate::Query`].

use lugh_core::{Agent, AgentStatus, Codebase, Conversation, IsolationEnv, PoolTask};
use lugh_storage::MaterializedState;
use serde::{Deserialize, Serialize};

/// Cross-cutting counts used by `StatusOverview`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSummary {
    pub conversations: usize,
    pub active_sessions: usize,
    pub codebases: usize,
    pub active_isolation_envs: usize,
    pub idle_agents: usize,
    pub busy_agents: usize,
    pub queued_tasks: usize,
}

impl StatusSummary {
    pub fn from_state(state: &MaterializedState) -> Self {
        Self {
            conversations: state.conversations.len(),
            active_sessions: state.sessions.values().filter(|s| s.active).count(),
            codebases: state.codebases.len(),
            active_isolation_envs: state.isolation_envs.values().filter(|e| e.is_active()).count(),
            idle_agents: state.agents.values().filter(|a| a.status == AgentStatus::Idle).count(),
            busy_agents: state.agents.values().filter(|a| a.status == AgentStatus::Busy).count(),
            queued_tasks: state.queued_tasks_by_priority().len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Error { message: String },

    Status(StatusSummary),

    Conversations(Vec<Conversation>),
    Conversation(Conversation),

    Codebases(Vec<Codebase>),
    Codebase(Codebase),

    IsolationEnvs(Vec<IsolationEnv>),
    IsolationEnv(IsolationEnv),

    Agents(Vec<Agent>),
    Agent(Agent),

    Tasks(Vec<PoolTask>),
    Task(PoolTask),

    NotFound,
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
