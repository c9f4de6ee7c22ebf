// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abort handle (spec §3 "Abort Handle", §9 design note): a cancellation
//! token paired with a boolean flag that survives the token being replaced.
//! `/stop` must read as "stopped" even after the next message installs a
//! fresh token for the following stream (spec Scenario 5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lugh_core::ConversationId;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AbortHandle {
    token: CancellationToken,
    stopped: Arc<AtomicBool>,
}

impl AbortHandle {
    fn new() -> Self {
        Self { token: CancellationToken::new(), stopped: Arc::new(AtomicBool::new(false)) }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Per-conversation abort handles (spec §9 "global-ish state... encapsulate
/// as an explicitly constructed service"). Single-writer: installing a new
/// handle for a conversation stops whatever handle was there before (spec
/// §5 "any prior abort controller is aborted and replaced").
#[derive(Default)]
pub struct AbortRegistry {
    handles: Mutex<HashMap<ConversationId, AbortHandle>>,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn install(&self, conversation_id: ConversationId) -> AbortHandle {
        let mut handles = self.handles.lock().await;
        if let Some(previous) = handles.get(&conversation_id) {
            previous.stop();
        }
        let handle = AbortHandle::new();
        handles.insert(conversation_id, handle.clone());
        handle
    }

    /// Returns `true` if a handle existed to stop (spec §6.3 `/stop`).
    pub async fn stop(&self, conversation_id: &ConversationId) -> bool {
        let handles = self.handles.lock().await;
        match handles.get(conversation_id) {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Clear the handle once a stream finishes, successfully or not (spec
    /// §4.8 step 10 "always clear the abort handle").
    pub async fn clear(&self, conversation_id: &ConversationId) {
        self.handles.lock().await.remove(conversation_id);
    }
}

#[cfg(test)]
#[path = "abort_tests.rs"]
mod tests;
