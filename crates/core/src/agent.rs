// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier and registry status types (spec §3 "Agent", §4.3 C3).
//!
//! An Agent is a registered worker process, not an AI assistant session;
//! `AgentId` is distinct from the assistant's own opaque session token
//! (see `crate::session::SessionId`).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a registered worker process.
///
/// Workers choose their own id on startup (hostname+pid, or a configured
/// name); the registry treats it as an opaque string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Registry status of an agent (spec §3 Agent, invariant `busy ⇔ current_task_id != null`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Busy,
    Offline,
}

crate::simple_display! {
    AgentStatus {
        Idle => "idle",
        Busy => "busy",
        Offline => "offline",
    }
}

/// A registered worker, as tracked by the Agent Registry (C3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    /// Invariant: `Some` iff `status == Busy`.
    pub current_task_id: Option<String>,
    pub last_heartbeat_ms: u64,
    pub registered_at_ms: u64,
}

impl Agent {
    pub fn new(agent_id: AgentId, capabilities: Vec<String>, now_ms: u64) -> Self {
        Self {
            agent_id,
            capabilities,
            status: AgentStatus::Idle,
            current_task_id: None,
            last_heartbeat_ms: now_ms,
            registered_at_ms: now_ms,
        }
    }

    /// Whether this agent's registry state upholds the busy/current_task invariant.
    pub fn invariant_holds(&self) -> bool {
        (self.status == AgentStatus::Busy) == self.current_task_id.is_some()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
