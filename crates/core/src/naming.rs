// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Branch, slug, and worktree path naming rules (spec §4.4 C4).

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::isolation_env::WorkflowType;

/// Lowercase a string, collapse runs of non-alphanumeric characters to a
/// single `-`, trim leading/trailing `-`, and truncate to 50 characters.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_dash = false;
    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = out.trim_matches('-');
    let truncated = if trimmed.len() > 50 { &trimmed[..50] } else { trimmed };
    truncated.trim_matches('-').to_string()
}

/// First 8 hex characters of the SHA-256 digest of `id`: deterministic,
/// not reversible, used for thread branch names.
pub fn short_hash(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..8].to_string()
}

/// Compute the git branch name for an isolation environment, per workflow
/// type (spec §4.4 branch naming table). PR branches always land on the
/// review tracking branch name regardless of whether the caller pinned a
/// SHA or not — the distinction is in how the worktree provider gets there
/// (detached checkout + local tracking branch vs. direct fetch), not in
/// the name itself.
pub fn branch_name(workflow_type: WorkflowType, workflow_id: &str) -> String {
    match workflow_type {
        WorkflowType::Issue => format!("issue-{workflow_id}"),
        WorkflowType::Pr => format!("pr-{workflow_id}-review"),
        WorkflowType::Review => format!("review-{workflow_id}"),
        WorkflowType::Task => format!("task-{}", slug(workflow_id)),
        WorkflowType::Thread => format!("thread-{}", short_hash(workflow_id)),
    }
}

/// Build the worktree path for a codebase/branch pair:
/// `{workspace_base}/{owner}/{repo}/worktrees/{owner}/{repo}/{branch}`.
/// The duplicated owner/repo segment prevents collisions when two
/// codebases named e.g. `utils` are cloned from different owners. Returns
/// `None` if the resolved path would escape `workspace_base` (a codebase
/// name or branch containing `..` must never be allowed to write outside
/// the configured workspace).
pub fn worktree_path(workspace_base: &Path, owner: &str, repo: &str, branch: &str) -> Option<PathBuf> {
    let candidate = workspace_base.join(owner).join(repo).join("worktrees").join(owner).join(repo).join(branch);
    is_within(workspace_base, &candidate).then_some(candidate)
}

/// Whether `candidate` (after normalizing away `.`/`..` components, without
/// touching the filesystem) falls under `root`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    normalize(candidate).starts_with(normalize(root))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
