// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree provider abstraction over `git` (spec §4.4 C4).
//!
//! The real provider shells out to `git` via `tokio::process::Command`
//! exclusively — arguments are passed as an argv array, never through a
//! shell, and every invocation is bounded by [`GIT_TIMEOUT`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const GIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn git: {0}")]
    Io(#[from] std::io::Error),
    #[error("git timed out after {0:?}")]
    Timeout(Duration),
    #[error("git exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },
}

/// Run `git <args>` with `cwd` as the working directory, bounded by
/// [`GIT_TIMEOUT`]. Returns trimmed stdout on success.
async fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    debug!(?cwd, ?args, "running git");
    let mut command = Command::new("git");
    command.current_dir(cwd).args(args).stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = tokio::time::timeout(GIT_TIMEOUT, command.output())
        .await
        .map_err(|_| GitError::Timeout(GIT_TIMEOUT))??;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Abstraction over the git-worktree operations the Isolation Manager needs,
/// so the resolution algorithm can be exercised without a real repository.
#[async_trait]
pub trait WorktreeProvider: Send + Sync + 'static {
    /// Create a worktree at `worktree_path` on a new branch `branch`. If the
    /// branch already exists, retries without `-b` (spec's
    /// branch-already-exists rule).
    async fn create(&self, repo_path: &Path, branch: &str, worktree_path: &Path) -> Result<(), GitError>;

    /// Path of an existing worktree already checked out at `branch`, if one
    /// exists under `repo_path` (spec §4.4 step 4, branch adoption).
    async fn worktree_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, GitError>;

    /// Remove a worktree. `force` tolerates uncommitted changes.
    async fn remove(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), GitError>;

    /// Whether `branch` has a merge ancestor in `default_branch`.
    async fn is_merged(&self, repo_path: &Path, branch: &str, default_branch: &str) -> Result<bool, GitError>;

    /// Unix-millis timestamp of the most recent commit on `branch`.
    async fn last_commit_at_ms(&self, repo_path: &Path, branch: &str) -> Result<u64, GitError>;

    /// Fetch `pull/{pr_id}/head` into the local branch `as_branch`.
    async fn fetch_pr(&self, repo_path: &Path, pr_id: &str, as_branch: &str) -> Result<(), GitError>;

    /// Fetch `pull/{pr_id}/head` and check it out detached at `sha`.
    async fn fetch_pr_at_sha(&self, repo_path: &Path, pr_id: &str, sha: &str, worktree_path: &Path) -> Result<(), GitError>;

    /// Create a local tracking branch `branch` at `HEAD` inside `worktree_path`
    /// (used to turn a detached SHA-pinned checkout into a named branch).
    async fn track_current_head(&self, worktree_path: &Path, branch: &str) -> Result<(), GitError>;
}

/// The real provider: every operation is a single `git` subprocess.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitWorktreeProvider;

#[async_trait]
impl WorktreeProvider for GitWorktreeProvider {
    async fn create(&self, repo_path: &Path, branch: &str, worktree_path: &Path) -> Result<(), GitError> {
        let path_str = worktree_path.to_string_lossy().into_owned();
        let result = run_git(repo_path, &["worktree", "add", "-b", branch, &path_str]).await;
        match result {
            Err(GitError::CommandFailed { stderr, .. }) if stderr.contains("already exists") => {
                run_git(repo_path, &["worktree", "add", &path_str, branch]).await.map(|_| ())
            }
            other => other.map(|_| ()),
        }
    }

    async fn worktree_for_branch(&self, repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, GitError> {
        let listing = run_git(repo_path, &["worktree", "list", "--porcelain"]).await?;
        let mut current_path: Option<&str> = None;
        for line in listing.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                current_path = Some(path);
            } else if let Some(branch_ref) = line.strip_prefix("branch refs/heads/") {
                if branch_ref == branch {
                    return Ok(current_path.map(PathBuf::from));
                }
            }
        }
        Ok(None)
    }

    async fn remove(&self, repo_path: &Path, worktree_path: &Path, force: bool) -> Result<(), GitError> {
        let path_str = worktree_path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        run_git(repo_path, &args).await.map(|_| ())
    }

    async fn is_merged(&self, repo_path: &Path, branch: &str, default_branch: &str) -> Result<bool, GitError> {
        match run_git(repo_path, &["merge-base", "--is-ancestor", branch, default_branch]).await {
            Ok(_) => Ok(true),
            Err(GitError::CommandFailed { status, .. }) if status == 1 => Ok(false),
            Err(other) => Err(other),
        }
    }

    async fn last_commit_at_ms(&self, repo_path: &Path, branch: &str) -> Result<u64, GitError> {
        let out = run_git(repo_path, &["log", "-1", "--format=%ct", branch]).await?;
        let secs: u64 = out.trim().parse().unwrap_or(0);
        Ok(secs.saturating_mul(1000))
    }

    async fn fetch_pr(&self, repo_path: &Path, pr_id: &str, as_branch: &str) -> Result<(), GitError> {
        let refspec = format!("pull/{pr_id}/head:{as_branch}");
        run_git(repo_path, &["fetch", "origin", &refspec]).await.map(|_| ())
    }

    async fn fetch_pr_at_sha(&self, repo_path: &Path, pr_id: &str, sha: &str, worktree_path: &Path) -> Result<(), GitError> {
        let refspec = format!("pull/{pr_id}/head");
        run_git(repo_path, &["fetch", "origin", &refspec]).await?;
        let path_str = worktree_path.to_string_lossy().into_owned();
        run_git(repo_path, &["worktree", "add", "--detach", &path_str, sha]).await.map(|_| ())
    }

    async fn track_current_head(&self, worktree_path: &Path, branch: &str) -> Result<(), GitError> {
        run_git(worktree_path, &["checkout", "-b", branch]).await.map(|_| ())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory fake provider for exercising the resolution algorithm
    /// without a real git repository.
    #[derive(Default)]
    pub struct FakeWorktreeProvider {
        pub worktrees: Mutex<HashMap<String, PathBuf>>,
        pub merged_branches: Mutex<Vec<String>>,
        pub last_commit_ms: Mutex<HashMap<String, u64>>,
    }

    impl FakeWorktreeProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed_worktree(&self, branch: &str, path: &Path) {
            self.worktrees.lock().unwrap().insert(branch.to_string(), path.to_path_buf());
        }

        pub fn mark_merged(&self, branch: &str) {
            self.merged_branches.lock().unwrap().push(branch.to_string());
        }

        pub fn set_last_commit_at_ms(&self, branch: &str, at_ms: u64) {
            self.last_commit_ms.lock().unwrap().insert(branch.to_string(), at_ms);
        }
    }

    #[async_trait]
    impl WorktreeProvider for FakeWorktreeProvider {
        async fn create(&self, _repo_path: &Path, branch: &str, worktree_path: &Path) -> Result<(), GitError> {
            self.worktrees.lock().unwrap().insert(branch.to_string(), worktree_path.to_path_buf());
            Ok(())
        }

        async fn worktree_for_branch(&self, _repo_path: &Path, branch: &str) -> Result<Option<PathBuf>, GitError> {
            Ok(self.worktrees.lock().unwrap().get(branch).cloned())
        }

        async fn remove(&self, _repo_path: &Path, worktree_path: &Path, _force: bool) -> Result<(), GitError> {
            self.worktrees.lock().unwrap().retain(|_, path| path != worktree_path);
            Ok(())
        }

        async fn is_merged(&self, _repo_path: &Path, branch: &str, _default_branch: &str) -> Result<bool, GitError> {
            Ok(self.merged_branches.lock().unwrap().iter().any(|b| b == branch))
        }

        async fn last_commit_at_ms(&self, _repo_path: &Path, branch: &str) -> Result<u64, GitError> {
            Ok(*self.last_commit_ms.lock().unwrap().get(branch).unwrap_or(&0))
        }

        async fn fetch_pr(&self, _repo_path: &Path, _pr_id: &str, as_branch: &str) -> Result<(), GitError> {
            self.worktrees.lock().unwrap().entry(as_branch.to_string()).or_insert_with(PathBuf::new);
            Ok(())
        }

        async fn fetch_pr_at_sha(&self, _repo_path: &Path, _pr_id: &str, _sha: &str, worktree_path: &Path) -> Result<(), GitError> {
            self.worktrees.lock().unwrap().insert("__detached__".into(), worktree_path.to_path_buf());
            Ok(())
        }

        async fn track_current_head(&self, worktree_path: &Path, branch: &str) -> Result<(), GitError> {
            self.worktrees.lock().unwrap().insert(branch.to_string(), worktree_path.to_path_buf());
            Ok(())
        }
    }
}
