// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat adapter contract consumed by the orchestrator (spec §6.1).

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Whether a platform wants incremental chunks as they arrive, or one
/// assembled message at the end of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingMode {
    Stream,
    Batch,
}

/// A chat platform the orchestrator can deliver messages through.
///
/// `send_file` is optional — platforms with no attachment support can leave
/// the default no-op.
#[async_trait]
pub trait ChatAdapter: Send + Sync + 'static {
    fn platform_type(&self) -> &'static str;
    fn streaming_mode(&self) -> StreamingMode;

    /// `text` is a UTF-8 string at or under the platform's message size
    /// limit; callers are responsible for splitting it beforehand.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), AdapterError>;

    async fn send_file(
        &self,
        conversation_id: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), AdapterError> {
        let _ = (conversation_id, path, caption);
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{AdapterError, ChatAdapter, StreamingMode};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SentMessage {
        Text { conversation_id: String, text: String },
        File { conversation_id: String, path: PathBuf, caption: Option<String> },
    }

    struct FakeChatAdapterState {
        sent: Vec<SentMessage>,
    }

    /// A scriptable in-memory `ChatAdapter` that records everything sent to it.
    #[derive(Clone)]
    pub struct FakeChatAdapter {
        platform_type: &'static str,
        streaming_mode: StreamingMode,
        inner: Arc<Mutex<FakeChatAdapterState>>,
    }

    impl FakeChatAdapter {
        pub fn new(platform_type: &'static str, streaming_mode: StreamingMode) -> Self {
            Self {
                platform_type,
                streaming_mode,
                inner: Arc::new(Mutex::new(FakeChatAdapterState { sent: Vec::new() })),
            }
        }

        pub fn sent(&self) -> Vec<SentMessage> {
            self.inner.lock().sent.clone()
        }
    }

    #[async_trait]
    impl ChatAdapter for FakeChatAdapter {
        fn platform_type(&self) -> &'static str {
            self.platform_type
        }

        fn streaming_mode(&self) -> StreamingMode {
            self.streaming_mode
        }

        async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), AdapterError> {
            self.inner.lock().sent.push(SentMessage::Text {
                conversation_id: conversation_id.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }

        async fn send_file(
            &self,
            conversation_id: &str,
            path: &Path,
            caption: Option<&str>,
        ) -> Result<(), AdapterError> {
            self.inner.lock().sent.push(SentMessage::File {
                conversation_id: conversation_id.to_string(),
                path: path.to_path_buf(),
                caption: caption.map(str::to_string),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChatAdapter, SentMessage};

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
