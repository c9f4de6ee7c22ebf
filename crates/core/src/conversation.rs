// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation identifier and entity (spec §3 "Conversation").
//!
//! A Conversation is identified externally by `(platform_type,
//! platform_conversation_id)`, e.g. a Slack thread or a GitHub issue
//! comment thread. `ConversationId` is the internal row id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::codebase::CodebaseId;

crate::define_id! {
    /// Internal identifier for a Conversation row.
    pub struct ConversationId("conv");
}

/// Platform a conversation originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Slack,
    GithubIssue,
    GithubPr,
    GithubReview,
    Cli,
}

crate::simple_display! {
    PlatformType {
        Slack => "slack",
        GithubIssue => "github_issue",
        GithubPr => "github_pr",
        GithubReview => "github_review",
        Cli => "cli",
    }
}

/// External coordinates that uniquely identify a conversation on its platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub platform_type: PlatformType,
    pub platform_conversation_id: String,
}

impl ConversationKey {
    pub fn new(platform_type: PlatformType, platform_conversation_id: impl Into<String>) -> Self {
        Self {
            platform_type,
            platform_conversation_id: platform_conversation_id.into(),
        }
    }
}

/// A bounded exchange between a platform user and an AI assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub key: ConversationKey,
    pub assistant_kind: String,
    /// Codebase this conversation is bound to, if any (spec §4.8 step 1).
    pub codebase_id: Option<CodebaseId>,
    /// Isolation environment this conversation is bound to, if any.
    pub isolation_env_id: Option<String>,
    /// Conversation this one was spawned from (e.g. a follow-up thread).
    pub parent_conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at_ms: u64,
    pub last_activity_at_ms: u64,
}

impl Conversation {
    pub fn new(key: ConversationKey, assistant_kind: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: ConversationId::new(),
            key,
            assistant_kind: assistant_kind.into(),
            codebase_id: None,
            isolation_env_id: None,
            parent_conversation_id: None,
            metadata: HashMap::new(),
            created_at_ms: now_ms,
            last_activity_at_ms: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
