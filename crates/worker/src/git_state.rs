// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Before/after git snapshots, diffed into the task completion summary
//! (spec §4.5 "Execution": `{commits_created, files_modified, tests_run,
//! tests_passed}` derived by comparing git state before and after).
//!
//! `tests_run`/`tests_passed` cannot be read out of git state itself, so
//! they're filled in from the assistant's own tool-call stream instead
//! (`TestActivity::observe`) while the git diff supplies the other two.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use lugh_adapters::AssistantEvent;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GitStateError {
    #[error("failed to spawn git: {0}")]
    Io(#[from] std::io::Error),
    #[error("git timed out after {0:?}")]
    Timeout(Duration),
}

async fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitStateError> {
    debug!(?cwd, ?args, "worker running git");
    let mut command = Command::new("git");
    command.current_dir(cwd).args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = tokio::time::timeout(GIT_TIMEOUT, command.output()).await.map_err(|_| GitStateError::Timeout(GIT_TIMEOUT))??;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A point-in-time snapshot of a worktree's committed and uncommitted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSnapshot {
    head: Option<String>,
    dirty_files: Vec<String>,
}

/// Best-effort snapshot: a `cwd` that isn't a git repo (or has no commits
/// yet) snapshots as empty rather than failing the task.
pub async fn snapshot(cwd: &Path) -> GitSnapshot {
    let head = run_git(cwd, &["rev-parse", "HEAD"]).await.ok().filter(|s| !s.is_empty());
    let dirty_files = run_git(cwd, &["status", "--porcelain"])
        .await
        .map(|out| out.lines().filter_map(parse_porcelain_path).collect())
        .unwrap_or_default();
    GitSnapshot { head, dirty_files }
}

fn parse_porcelain_path(line: &str) -> Option<String> {
    line.get(3..).map(str::to_string)
}

/// The structured completion summary the worker reports via `complete`
/// (spec §4.5 "Execution").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub commits_created: usize,
    pub files_modified: usize,
    pub tests_run: usize,
    pub tests_passed: usize,
}

impl TaskSummary {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

/// Diff two snapshots of the same worktree into commit/file counts.
pub async fn diff(cwd: &Path, before: &GitSnapshot, after: &GitSnapshot) -> TaskSummary {
    let mut modified: std::collections::BTreeSet<String> = after.dirty_files.iter().cloned().collect();
    let mut commits_created = 0usize;

    if let (Some(before_head), Some(after_head)) = (&before.head, &after.head) {
        if before_head != after_head {
            if let Ok(count) = run_git(cwd, &["rev-list", "--count", &format!("{before_head}..{after_head}")]).await {
                commits_created = count.parse().unwrap_or(0);
            }
            if let Ok(names) = run_git(cwd, &["diff", "--name-only", before_head, after_head]).await {
                modified.extend(names.lines().map(str::to_string));
            }
        }
    }

    TaskSummary { commits_created, files_modified: modified.len(), tests_run: 0, tests_passed: 0 }
}

/// Heuristic test-runner activity, gathered from `Tool` events seen while
/// an assistant session runs (coarse, by design — matches the kind of
/// substring classification the recovery manager uses for its own
/// error-pattern buckets).
#[derive(Debug, Clone, Copy, Default)]
pub struct TestActivity {
    pub tests_run: usize,
    pub tests_passed: usize,
}

impl TestActivity {
    /// Look for a `{tool_name}` containing "test" whose input carries
    /// `ran`/`passed` counts, and keep the highest-reported pair — the
    /// assistant typically reports a growing total as a suite progresses.
    pub fn observe(&mut self, event: &AssistantEvent) {
        let AssistantEvent::Tool { tool_name, tool_input } = event else { return };
        if !tool_name.to_lowercase().contains("test") {
            return;
        }
        let ran = tool_input.get("tests_run").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        let passed = tool_input.get("tests_passed").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        if ran >= self.tests_run {
            self.tests_run = ran;
            self.tests_passed = passed;
        }
    }

    pub fn apply(self, summary: &mut TaskSummary) {
        summary.tests_run = self.tests_run;
        summary.tests_passed = self.tests_passed;
    }
}

#[cfg(test)]
#[path = "git_state_tests.rs"]
mod tests;
