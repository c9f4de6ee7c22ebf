// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-registry: agent registry (spec §4.3 C3).
//!
//! Tracks worker identity, capabilities, status, heartbeat and current task,
//! atop the shared [`lugh_storage::Store`]. `set_status(idle)` always clears
//! `current_task_id`; `prune_stale` offlines agents whose heartbeat has gone
//! quiet for longer than the caller's threshold.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use lugh_core::{Agent, AgentId, AgentStatus};
use lugh_storage::{Event, Store, StoreError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Aggregate agent counts by status (spec §4.6 `status()`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub total: usize,
    pub idle: usize,
    pub busy: usize,
    pub offline: usize,
}

/// The agent registry, backed by the shared persisted store.
pub struct Registry {
    store: Arc<Mutex<Store>>,
}

impl Registry {
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    /// Upsert an agent. On conflict with an existing id, resets status to
    /// idle and refreshes heartbeat/registration time (spec §4.3).
    pub async fn register(
        &self,
        agent_id: AgentId,
        capabilities: Vec<String>,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let agent = Agent::new(agent_id, capabilities, now_ms);
        let mut store = self.store.lock().await;
        store.apply(Event::AgentRegistered { agent })?;
        Ok(())
    }

    /// Refresh an agent's heartbeat. A missing agent only warns, per spec
    /// (a worker that heartbeats before its registration is replayed should
    /// not be treated as an error).
    pub async fn heartbeat(&self, agent_id: &AgentId, now_ms: u64) -> Result<(), RegistryError> {
        let mut store = self.store.lock().await;
        if !store.state().agents.contains_key(agent_id.as_str()) {
            warn!(%agent_id, "heartbeat from unknown agent");
        }
        store.apply(Event::AgentHeartbeat { agent_id: agent_id.to_string(), at_ms: now_ms })?;
        Ok(())
    }

    /// Atomically set an agent's status and current task, refreshing its
    /// heartbeat (spec invariant: `set_status(idle)` clears `current_task_id`).
    pub async fn set_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
        current_task_id: Option<String>,
        now_ms: u64,
    ) -> Result<(), RegistryError> {
        let mut store = self.store.lock().await;
        match status {
            AgentStatus::Busy => {
                let task_id = current_task_id.unwrap_or_default();
                store.apply(Event::AgentAssigned { agent_id: agent_id.to_string(), task_id })?;
            }
            AgentStatus::Idle => {
                store.apply(Event::AgentFreed { agent_id: agent_id.to_string() })?;
            }
            AgentStatus::Offline => {
                store.apply(Event::AgentOffline { agent_id: agent_id.to_string() })?;
            }
        }
        store.apply(Event::AgentHeartbeat { agent_id: agent_id.to_string(), at_ms: now_ms })?;
        Ok(())
    }

    /// Idle agents, most-recently-heartbeated first.
    pub async fn get_available(&self) -> Vec<Agent> {
        let store = self.store.lock().await;
        let mut agents: Vec<Agent> = store.state().idle_agents().cloned().collect();
        agents.sort_by(|a, b| b.last_heartbeat_ms.cmp(&a.last_heartbeat_ms));
        agents
    }

    /// Offline every non-offline agent whose heartbeat is older than
    /// `max_age_s`, clearing its current task. Returns the pruned ids.
    pub async fn prune_stale(&self, max_age_s: u64, now_ms: u64) -> Result<Vec<AgentId>, RegistryError> {
        let threshold_ms = max_age_s.saturating_mul(1000);
        let mut store = self.store.lock().await;
        let stale: Vec<AgentId> = store
            .state()
            .agents
            .values()
            .filter(|a| a.status != AgentStatus::Offline)
            .filter(|a| now_ms.saturating_sub(a.last_heartbeat_ms) > threshold_ms)
            .map(|a| a.agent_id.clone())
            .collect();

        for agent_id in &stale {
            store.apply(Event::AgentOffline { agent_id: agent_id.to_string() })?;
        }
        Ok(stale)
    }

    /// Count of registered agents by status.
    pub async fn get_stats(&self) -> AgentStats {
        let store = self.store.lock().await;
        let mut stats = AgentStats::default();
        for agent in store.state().agents.values() {
            stats.total += 1;
            match agent.status {
                AgentStatus::Idle => stats.idle += 1,
                AgentStatus::Busy => stats.busy += 1,
                AgentStatus::Offline => stats.offline += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
