// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the orchestrator (spec §6.6).

use std::path::PathBuf;

/// Root directory codebases are cloned and worktrees created under, default
/// `~/.lugh/workspaces`.
pub fn workspace_path() -> PathBuf {
    if let Ok(dir) = std::env::var("WORKSPACE_PATH") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".lugh").join("workspaces")
}

/// Whether a high-risk tool invocation should fire a desktop notification
/// (default true).
pub fn notify_on_risk_tools() -> bool {
    std::env::var("NOTIFY_ON_RISK_TOOLS").ok().and_then(|s| s.parse().ok()).unwrap_or(true)
}

/// Whether a high-risk tool invocation should block on approval before
/// running, rather than merely being logged (default false).
pub fn blocking_approvals() -> bool {
    std::env::var("BLOCKING_APPROVALS").ok().and_then(|s| s.parse().ok()).unwrap_or(false)
}

/// `STALE_THRESHOLD_DAYS` — age past which an unmerged worktree branch is a
/// cleanup-stale candidate (default 14).
pub fn stale_threshold_days() -> u64 {
    std::env::var("STALE_THRESHOLD_DAYS").ok().and_then(|s| s.parse().ok()).unwrap_or(14)
}
