// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-isolation: git-worktree sandbox manager (spec §4.4 C4).
//!
//! Resolves a `(codebase, workflow_type, workflow_id, hints)` request to a
//! working directory such that unrelated workflows never see each other's
//! uncommitted changes, while legitimately related workflows (a shared
//! linked issue, an externally-adopted PR branch) may share one.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod provider;

pub use provider::{GitError, GitWorktreeProvider, WorktreeProvider, GIT_TIMEOUT};
#[cfg(any(test, feature = "test-support"))]
pub use provider::fake::FakeWorktreeProvider;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lugh_core::{worktree_path, CodebaseId, IsolationEnv, IsolationEnvId, IsolationKey, WorkflowType};
use lugh_storage::{Event, Store, StoreError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Default per-codebase worktree cap (spec §4.4 step 5).
pub const MAX_WORKTREES_PER_CODEBASE: usize = 10;
/// Default age, in days, past which an unmerged branch is considered for
/// stale cleanup (spec §4.4 cleanup service).
pub const STALE_THRESHOLD_DAYS: u64 = 14;

#[derive(Debug, Error)]
pub enum IsolationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("codebase {0} has reached its worktree limit")]
    LimitReached(String),
    #[error("codebase name is not in owner/repo form")]
    InvalidCodebaseName,
    #[error("resolved worktree path would escape the workspace base")]
    PathEscape,
    #[error("codebase {0} not found")]
    CodebaseNotFound(String),
    #[error("isolation env {0} not found")]
    EnvNotFound(String),
}

/// Caller-supplied hints that let resolution reuse or adopt an existing
/// sandbox instead of always creating a fresh one (spec §4.4 steps 3-4).
#[derive(Debug, Clone, Default)]
pub struct ResolveHints {
    pub linked_issues: Vec<String>,
    pub pr_branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub codebase_id: CodebaseId,
    pub workflow_type: WorkflowType,
    pub workflow_id: String,
    /// The conversation's current isolation env reference, if any (step 1).
    pub existing_env_id: Option<IsolationEnvId>,
    pub hints: ResolveHints,
    pub creator_platform: String,
    pub default_branch: String,
}

#[derive(Debug, Default, Clone)]
pub struct CleanupReport {
    pub removed: Vec<IsolationEnvId>,
    /// `(env, reason)` pairs for envs preserved despite being eligible, so
    /// the caller can surface why (spec §4.4 cleanup service).
    pub skipped: Vec<(IsolationEnvId, String)>,
}

/// Sandboxes working directories behind git worktrees, backed by the shared
/// persisted store.
pub struct IsolationManager {
    store: Arc<Mutex<Store>>,
    provider: Arc<dyn WorktreeProvider>,
    workspace_base: PathBuf,
}

impl IsolationManager {
    pub fn new(store: Arc<Mutex<Store>>, provider: Arc<dyn WorktreeProvider>, workspace_base: PathBuf) -> Self {
        Self { store, provider, workspace_base }
    }

    /// Run the six-step resolution algorithm (spec §4.4).
    pub async fn resolve(&self, req: ResolveRequest, now_ms: u64) -> Result<IsolationEnv, IsolationError> {
        let (owner, repo, repo_path) = self.codebase_paths(&req.codebase_id).await?;
        let key = IsolationKey::new(req.codebase_id.clone(), req.workflow_type, req.workflow_id.clone());

        // Step 1: validate existing reference.
        if let Some(existing_id) = &req.existing_env_id {
            if let Some(env) = self.get_env(existing_id).await {
                if env.is_active() {
                    if path_exists(&env.path).await {
                        return Ok(env);
                    }
                    self.mark_destroyed(&env.id.to_string(), now_ms).await?;
                }
            }
        }

        // Step 2: reuse by workflow identity.
        if let Some(env) = self.find_active(&key).await {
            if path_exists(&env.path).await {
                return Ok(env);
            }
        }

        // Step 3: shared linked issue.
        for issue in &req.hints.linked_issues {
            let issue_key = IsolationKey::new(req.codebase_id.clone(), WorkflowType::Issue, issue.clone());
            if let Some(env) = self.find_active(&issue_key).await {
                if path_exists(&env.path).await {
                    info!(issue, env_id = %env.id, "reusing isolation env for linked issue");
                    return Ok(env);
                }
            }
        }

        // Step 4: branch adoption.
        if let Some(pr_branch) = &req.hints.pr_branch {
            if let Some(path) = self.provider.worktree_for_branch(&repo_path, pr_branch).await? {
                let mut env = IsolationEnv::new(
                    key.clone(),
                    "git_worktree",
                    path.to_string_lossy().into_owned(),
                    pr_branch.clone(),
                    req.creator_platform.clone(),
                    now_ms,
                );
                env.metadata.insert("adopted".into(), serde_json::json!(true));
                env.metadata.insert("adopted_from".into(), serde_json::json!("skill"));
                self.persist_created(env.clone()).await?;
                return Ok(env);
            }
        }

        // Step 5: capacity check + auto-cleanup.
        if self.active_count(&req.codebase_id).await >= MAX_WORKTREES_PER_CODEBASE {
            let report = self.cleanup_merged(&req.codebase_id, &repo_path, &req.default_branch, now_ms).await?;
            if report.removed.is_empty() {
                return Err(IsolationError::LimitReached(req.codebase_id.to_string()));
            }
        }

        // Step 6: create.
        let branch = lugh_core::branch_name(req.workflow_type, &req.workflow_id);
        let path = worktree_path(&self.workspace_base, owner.as_str(), repo.as_str(), &branch)
            .ok_or(IsolationError::PathEscape)?;
        self.provider.create(&repo_path, &branch, &path).await?;
        let env = IsolationEnv::new(key, "git_worktree", path.to_string_lossy().into_owned(), branch, req.creator_platform, now_ms);
        self.persist_created(env.clone()).await?;
        Ok(env)
    }

    /// Remove an isolation environment's worktree and mark its row destroyed.
    /// Tolerates a missing path (spec §4.4 Destruction) by skipping straight
    /// to marking it destroyed.
    pub async fn destroy(&self, env_id: &IsolationEnvId, force: bool, now_ms: u64) -> Result<(), IsolationError> {
        let env = self
            .get_env(&env_id.to_string())
            .await
            .ok_or_else(|| IsolationError::EnvNotFound(env_id.to_string()))?;
        if path_exists(&env.path).await {
            let (.., repo_path) = self.codebase_paths(&env.key.codebase_id).await?;
            self.provider.remove(&repo_path, Path::new(&env.path), force).await?;
        }
        self.mark_destroyed(&env.id.to_string(), now_ms).await?;
        Ok(())
    }

    /// Remove every active env for `codebase_id` whose branch is fully
    /// merged into `default_branch`.
    pub async fn cleanup_merged(
        &self,
        codebase_id: &CodebaseId,
        repo_path: &Path,
        default_branch: &str,
        now_ms: u64,
    ) -> Result<CleanupReport, IsolationError> {
        let mut report = CleanupReport::default();
        for env in self.active_envs(codebase_id).await {
            if self.provider.is_merged(repo_path, &env.branch, default_branch).await? {
                match self.provider.remove(repo_path, Path::new(&env.path), false).await {
                    Ok(()) => {
                        self.mark_destroyed(&env.id.to_string(), now_ms).await?;
                        report.removed.push(env.id);
                    }
                    Err(e) => report.skipped.push((env.id, e.to_string())),
                }
            }
        }
        Ok(report)
    }

    /// Remove every active env for `codebase_id` with no commits in
    /// `stale_threshold_days`, when merged or when a plain remove succeeds
    /// without `force`; otherwise the env is preserved and reported skipped.
    pub async fn cleanup_stale(
        &self,
        codebase_id: &CodebaseId,
        repo_path: &Path,
        default_branch: &str,
        stale_threshold_days: u64,
        now_ms: u64,
    ) -> Result<CleanupReport, IsolationError> {
        let threshold_ms = stale_threshold_days.saturating_mul(86_400_000);
        let mut report = CleanupReport::default();
        for env in self.active_envs(codebase_id).await {
            let last_commit_ms = self.provider.last_commit_at_ms(repo_path, &env.branch).await.unwrap_or(0);
            if now_ms.saturating_sub(last_commit_ms) <= threshold_ms {
                continue;
            }
            let merged = self.provider.is_merged(repo_path, &env.branch, default_branch).await.unwrap_or(false);
            match self.provider.remove(repo_path, Path::new(&env.path), false).await {
                Ok(()) => {
                    self.mark_destroyed(&env.id.to_string(), now_ms).await?;
                    report.removed.push(env.id);
                }
                Err(_) if merged => match self.provider.remove(repo_path, Path::new(&env.path), true).await {
                    Ok(()) => {
                        self.mark_destroyed(&env.id.to_string(), now_ms).await?;
                        report.removed.push(env.id);
                    }
                    Err(e) => report.skipped.push((env.id, e.to_string())),
                },
                Err(e) => report.skipped.push((env.id, e.to_string())),
            }
        }
        Ok(report)
    }

    async fn codebase_paths(&self, codebase_id: &CodebaseId) -> Result<(String, String, PathBuf), IsolationError> {
        let store = self.store.lock().await;
        let codebase = store
            .state()
            .codebases
            .get(&codebase_id.to_string())
            .ok_or_else(|| IsolationError::CodebaseNotFound(codebase_id.to_string()))?;
        let (owner, repo) = codebase.owner_repo().ok_or(IsolationError::InvalidCodebaseName)?;
        Ok((owner.to_string(), repo.to_string(), PathBuf::from(&codebase.default_cwd)))
    }

    async fn get_env(&self, env_id: &str) -> Option<IsolationEnv> {
        self.store.lock().await.state().isolation_envs.get(env_id).cloned()
    }

    async fn find_active(&self, key: &IsolationKey) -> Option<IsolationEnv> {
        self.store.lock().await.state().find_active_env(key).cloned()
    }

    async fn active_envs(&self, codebase_id: &CodebaseId) -> Vec<IsolationEnv> {
        self.store.lock().await.state().active_envs_for_codebase(&codebase_id.to_string()).cloned().collect()
    }

    async fn active_count(&self, codebase_id: &CodebaseId) -> usize {
        self.active_envs(codebase_id).await.len()
    }

    async fn persist_created(&self, env: IsolationEnv) -> Result<(), IsolationError> {
        self.store.lock().await.apply(Event::IsolationEnvCreated { env })?;
        Ok(())
    }

    async fn mark_destroyed(&self, env_id: &str, now_ms: u64) -> Result<(), IsolationError> {
        self.store.lock().await.apply(Event::IsolationEnvDestroyed { env_id: env_id.to_string(), at_ms: now_ms })?;
        Ok(())
    }
}

async fn path_exists(path: &str) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
#[path = "isolation_tests.rs"]
mod tests;
