// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolation environment identifier and entity (spec §3 "Isolation Env", §4.4 C4).
//!
//! An isolation environment is a sandboxed working copy (a git worktree, in
//! the only provider this crate ships) scoped to one `(codebase_id,
//! workflow_type, workflow_id)` triple.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::codebase::CodebaseId;

crate::define_id! {
    /// Internal identifier for an Isolation Env row.
    pub struct IsolationEnvId("isol");
}

/// The kind of platform entity an isolation environment is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Issue,
    Pr,
    Review,
    Thread,
    Task,
}

crate::simple_display! {
    WorkflowType {
        Issue => "issue",
        Pr => "pr",
        Review => "review",
        Thread => "thread",
        Task => "task",
    }
}

/// Lifecycle state of an isolation environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationStatus {
    Active,
    Destroyed,
}

crate::simple_display! {
    IsolationStatus {
        Active => "active",
        Destroyed => "destroyed",
    }
}

/// Uniqueness key for an isolation environment (P1: at most one active row
/// per key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsolationKey {
    pub codebase_id: CodebaseId,
    pub workflow_type: WorkflowType,
    pub workflow_id: String,
}

impl IsolationKey {
    pub fn new(codebase_id: CodebaseId, workflow_type: WorkflowType, workflow_id: impl Into<String>) -> Self {
        Self {
            codebase_id,
            workflow_type,
            workflow_id: workflow_id.into(),
        }
    }
}

/// A sandboxed working copy backing one or more conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationEnv {
    pub id: IsolationEnvId,
    pub key: IsolationKey,
    /// Name of the provider that created this environment, e.g. "git_worktree".
    pub provider: String,
    pub path: String,
    pub branch: String,
    pub status: IsolationStatus,
    /// Platform that triggered creation, e.g. "github", "slack".
    pub creator_platform: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at_ms: u64,
    pub destroyed_at_ms: Option<u64>,
}

impl IsolationEnv {
    pub fn new(
        key: IsolationKey,
        provider: impl Into<String>,
        path: impl Into<String>,
        branch: impl Into<String>,
        creator_platform: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: IsolationEnvId::new(),
            key,
            provider: provider.into(),
            path: path.into(),
            branch: branch.into(),
            status: IsolationStatus::Active,
            creator_platform: creator_platform.into(),
            metadata: HashMap::new(),
            created_at_ms: now_ms,
            destroyed_at_ms: None,
        }
    }

    pub fn destroy(&mut self, now_ms: u64) {
        self.status = IsolationStatus::Destroyed;
        self.destroyed_at_ms = Some(now_ms);
    }

    pub fn is_active(&self) -> bool {
        self.status == IsolationStatus::Active
    }
}

#[cfg(test)]
#[path = "isolation_env_tests.rs"]
mod tests;
