// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker binary.

use std::path::PathBuf;
use std::time::Duration;

use lugh_core::AgentId;

/// Resolve the state directory: `LUGH_STATE_DIR` > `XDG_STATE_HOME/lugh` >
/// `~/.local/state/lugh`, mirroring the teacher's own `state_dir` precedence.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("LUGH_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("lugh"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/lugh"))
}

/// Heartbeat cadence (spec §4.5: "every `HEARTBEAT_INTERVAL_MS` (default 5s)").
///
/// Distinct from the pool coordinator's 30s cleanup sweep (spec §4.6) even
/// though §6.6 lists `AGENT_HEARTBEAT_INTERVAL_MS` at 30000 — that entry
/// describes how stale a heartbeat may go before `prune_stale` offlines the
/// agent, not how often the worker emits one, so the worker keeps the more
/// specific 5s cadence from §4.5.
pub fn heartbeat_interval() -> Duration {
    std::env::var("AGENT_HEARTBEAT_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Worker identity: `LUGH_AGENT_ID` if set, else `{hostname}-{pid}` (spec §3
/// Agent: "Workers choose their own id on startup").
pub fn agent_id() -> AgentId {
    if let Ok(id) = std::env::var("LUGH_AGENT_ID") {
        if !id.is_empty() {
            return AgentId::new(id);
        }
    }
    let host = hostname();
    AgentId::new(format!("{host}-{}", std::process::id()))
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string())
}

/// Declared capabilities, comma-separated in `LUGH_AGENT_CAPABILITIES`.
pub fn capabilities() -> Vec<String> {
    std::env::var("LUGH_AGENT_CAPABILITIES")
        .ok()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Number of in-process worker tasks this binary runs (spec §6.6
/// `AGENT_POOL_SIZE`, default 4).
pub fn agent_pool_size() -> usize {
    std::env::var("AGENT_POOL_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(4)
}

/// External assistant CLI to spawn per query, and any fixed leading
/// arguments before the prompt. Not part of the spec's own env-var table
/// since the AI session backend is a consumed contract (§6.2) rather than
/// something this workspace defines defaults for.
pub fn assistant_command() -> (String, Vec<String>) {
    let command = std::env::var("LUGH_ASSISTANT_COMMAND").unwrap_or_else(|_| "lugh-assistant".to_string());
    let args = std::env::var("LUGH_ASSISTANT_ARGS")
        .ok()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    (command, args)
}
