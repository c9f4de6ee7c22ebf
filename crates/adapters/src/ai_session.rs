// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI session backend contract consumed by the orchestrator (spec §6.2).
//!
//! A query yields a finite stream of events terminated by a `Result` event;
//! a stream that ends without one is an error, not silent completion.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// One event emitted while an assistant session runs a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    Assistant { content: String },
    Tool { tool_name: String, tool_input: serde_json::Value },
    Result { session_id: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("assistant backend error: {0}")]
    Backend(String),
    #[error("assistant stream ended without a result event")]
    NoResult,
}

/// An AI assistant backend capable of streaming a response to a prompt,
/// optionally resuming a prior session.
#[async_trait]
pub trait AssistantSession: Send + Sync + 'static {
    /// Begin a query; the returned receiver yields events in arrival order
    /// and is closed once the stream ends (spec §5 "streaming events ...
    /// forwarded in arrival order").
    async fn send_query(
        &self,
        prompt: &str,
        cwd: &Path,
        previous_session_handle: Option<&str>,
    ) -> Result<mpsc::Receiver<AssistantEvent>, SessionError>;
}

/// Drain `events` until a `Result` event appears, returning its
/// `session_id`. A stream that closes first is [`SessionError::NoResult`]
/// (spec §6.2: "iteration ending without a result is an error").
pub async fn drain_to_result(
    mut events: mpsc::Receiver<AssistantEvent>,
    mut on_event: impl FnMut(&AssistantEvent),
) -> Result<String, SessionError> {
    while let Some(event) = events.recv().await {
        on_event(&event);
        if let AssistantEvent::Result { session_id } = event {
            return Ok(session_id);
        }
    }
    Err(SessionError::NoResult)
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::path::Path;

    use async_trait::async_trait;

    use super::{AssistantEvent, AssistantSession, SessionError};

    /// A scriptable `AssistantSession` that replays a fixed event sequence,
    /// or fails, regardless of the prompt it's given.
    pub struct FakeAssistantSession {
        script: Vec<AssistantEvent>,
        fail_with: Option<String>,
    }

    impl FakeAssistantSession {
        pub fn scripted(events: Vec<AssistantEvent>) -> Self {
            Self { script: events, fail_with: None }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self { script: Vec::new(), fail_with: Some(message.into()) }
        }
    }

    #[async_trait]
    impl AssistantSession for FakeAssistantSession {
        async fn send_query(
            &self,
            _prompt: &str,
            _cwd: &Path,
            _previous_session_handle: Option<&str>,
        ) -> Result<tokio::sync::mpsc::Receiver<AssistantEvent>, SessionError> {
            if let Some(message) = &self.fail_with {
                return Err(SessionError::Backend(message.clone()));
            }
            let (tx, rx) = tokio::sync::mpsc::channel(self.script.len().max(1));
            for event in self.script.clone() {
                let _ = tx.send(event).await;
            }
            Ok(rx)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAssistantSession;

#[cfg(test)]
#[path = "ai_session_tests.rs"]
mod tests;
