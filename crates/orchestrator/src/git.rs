// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical-repo cloning for `/clone` (spec §4.8, §6.4 "execFile, never
//! shell, 30s timeout"). Worktree-level git operations live in
//! `lugh-isolation`; this is the one operation the orchestrator itself runs
//! against a remote, so it gets its own small subprocess wrapper rather than
//! pulling the whole isolation provider trait in for one call.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const CLONE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("failed to spawn git: {0}")]
    Io(#[from] std::io::Error),
    #[error("git clone timed out after {0:?}")]
    Timeout(Duration),
    #[error("git clone exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },
}

/// Clone `remote_url` into `dest`, which must not already exist.
pub async fn clone_repo(remote_url: &str, dest: &Path) -> Result<(), CloneError> {
    debug!(remote_url, ?dest, "cloning repository");
    let mut command = Command::new("git");
    command.args(["clone", remote_url, &dest.to_string_lossy()]).stdout(Stdio::piped()).stderr(Stdio::piped());

    let output =
        tokio::time::timeout(CLONE_TIMEOUT, command.output()).await.map_err(|_| CloneError::Timeout(CLONE_TIMEOUT))??;

    if !output.status.success() {
        return Err(CloneError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
