// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the ops CLI (spec §6.6).

use std::path::PathBuf;

/// State directory precedence, matching `lugh-worker::env::state_dir`:
/// `LUGH_STATE_DIR` > `XDG_STATE_HOME/lugh` > `~/.local/state/lugh`.
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

/// Unix socket the ops daemon listens on for `lugh-wire` queries. `LUGH_SOCKET_PATH`
/// overrides the default `{state_dir}/lugh.sock`.
pub fn socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("LUGH_SOCKET_PATH") {
        return PathBuf::from(path);
    }
    state_dir().unwrap_or_else(|| PathBuf::from(".")).join("lugh.sock")
}

/// Root directory codebases are cloned and worktrees created under, shared
/// with `lugh-orchestrator::env::workspace_path` (default `~/.lugh/workspaces`).
pub fn workspace_path() -> PathBuf {
    if let Ok(dir) = std::env::var("WORKSPACE_PATH") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".lugh").join("workspaces")
}
