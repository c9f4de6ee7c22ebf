// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and entity (spec §3 "Session").
//!
//! `SessionId` wraps the opaque resumable handle returned by the assistant
//! backend (spec §6.2 `Event::result.session_id`). It is distinct from
//! `AgentId`, which identifies a registered worker process.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use crate::conversation::ConversationId;

crate::define_id! {
    /// Internal identifier for a Session row.
    pub struct SessionRowId("sess");
}

/// Opaque, assistant-backend-defined resumable session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One bounded AI conversation with a resumable handle (spec §3 "Session").
///
/// Invariant (P2): at most one row per conversation has `active == true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionRowId,
    pub conversation_id: ConversationId,
    pub codebase_id: Option<String>,
    pub assistant_kind: String,
    /// The resumable handle, once the assistant backend has returned one.
    pub external_session_id: Option<SessionId>,
    pub active: bool,
    /// Free-form metadata, including `lastCommand` (spec §4.8 step 9).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at_ms: u64,
    pub last_activity_at_ms: u64,
}

impl Session {
    pub fn new(conversation_id: ConversationId, assistant_kind: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: SessionRowId::new(),
            conversation_id,
            codebase_id: None,
            assistant_kind: assistant_kind.into(),
            external_session_id: None,
            active: true,
            metadata: HashMap::new(),
            created_at_ms: now_ms,
            last_activity_at_ms: now_ms,
        }
    }

    pub fn last_command(&self) -> Option<&str> {
        self.metadata.get("lastCommand").and_then(|v| v.as_str())
    }

    pub fn set_last_command(&mut self, command: impl Into<String>) {
        self.metadata.insert("lastCommand".to_string(), serde_json::Value::String(command.into()));
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
