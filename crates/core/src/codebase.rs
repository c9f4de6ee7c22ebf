// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codebase identifier and entity (spec §3 "Codebase").
//!
//! A Codebase is a registered git remote, keyed by its `owner/repo` name,
//! with a default working directory and a table of named commands.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Internal identifier for a Codebase row.
    pub struct CodebaseId("code");
}

/// A registered git remote and its default working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Codebase {
    pub id: CodebaseId,
    /// `owner/repo`, unique across the table.
    pub name: String,
    pub remote_url: String,
    pub default_cwd: String,
    pub assistant_kind: String,
    /// Named command -> path relative to `default_cwd`.
    #[serde(default)]
    pub commands: HashMap<String, String>,
    pub created_at_ms: u64,
}

impl Codebase {
    pub fn new(
        name: impl Into<String>,
        remote_url: impl Into<String>,
        default_cwd: impl Into<String>,
        assistant_kind: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: CodebaseId::new(),
            name: name.into(),
            remote_url: remote_url.into(),
            default_cwd: default_cwd.into(),
            assistant_kind: assistant_kind.into(),
            commands: HashMap::new(),
            created_at_ms: now_ms,
        }
    }

    pub fn command(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(String::as_str)
    }

    /// Split `name` into its `(owner, repo)` halves, used to build the
    /// owner/repo-duplicated worktree path (spec §4.4).
    pub fn owner_repo(&self) -> Option<(&str, &str)> {
        self.name.split_once('/')
    }
}

#[cfg(test)]
#[path = "codebase_tests.rs"]
mod tests;
