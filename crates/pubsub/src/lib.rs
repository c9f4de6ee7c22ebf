// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-pubsub: best-effort channel pub/sub (spec §4.1 C1).
//!
//! `publish` is fire-and-forget — it succeeds once handed off in-process,
//! with no delivery guarantee to a subscriber that isn't currently
//! listening. Channel names are canonicalized identically on both the
//! publish and subscribe paths via [`lugh_core::channel::canonicalize_channel`],
//! closing the historical drift the two sides used to have.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lugh_core::channel::canonicalize_channel;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

/// Payloads larger than this are still delivered, but warned about; callers
/// are expected to send an identifier instead of a large blob (spec §4.1).
pub const PAYLOAD_WARN_BYTES: usize = 7 * 1024 + 900;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("pubsub has been shut down")]
    ShutDown,
}

/// A registered handler for messages on a channel. Handlers for the same
/// channel are invoked concurrently, one task per delivered message.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, payload: serde_json::Value);
}

/// Opaque handle returned by `subscribe`, used to remove a single handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct ChannelState {
    sender: broadcast::Sender<serde_json::Value>,
    handlers: HashMap<HandlerId, JoinHandle<()>>,
}

impl ChannelState {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, handlers: HashMap::new() }
    }
}

/// In-process best-effort pub/sub over canonicalized channel names.
pub struct PubSub {
    channels: Mutex<HashMap<String, ChannelState>>,
    next_id: AtomicU64,
    shut_down: AtomicBool,
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSub {
    pub fn new() -> Self {
        Self { channels: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1), shut_down: AtomicBool::new(false) }
    }

    /// Fire-and-forget publish. Succeeds even if no subscriber is currently
    /// listening (spec §4.1: delivery is not guaranteed across downtime).
    pub async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PubSubError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(PubSubError::ShutDown);
        }
        let channel = canonicalize_channel(channel);
        if let Ok(encoded) = serde_json::to_vec(&payload) {
            if encoded.len() > PAYLOAD_WARN_BYTES {
                warn!(channel, bytes = encoded.len(), "pubsub payload exceeds recommended size, send an identifier instead");
            }
        }

        let channels = self.channels.lock().await;
        if let Some(state) = channels.get(&channel) {
            let _ = state.sender.send(payload);
        }
        Ok(())
    }

    /// Register a handler on a channel. Returns an id usable with
    /// `unsubscribe` to remove just this handler.
    pub async fn subscribe(&self, channel: &str, handler: Arc<dyn Handler>) -> Result<HandlerId, PubSubError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(PubSubError::ShutDown);
        }
        let channel = canonicalize_channel(channel);
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut channels = self.channels.lock().await;
        let state = channels.entry(channel).or_insert_with(ChannelState::new);
        let mut rx = state.sender.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        let handler = handler.clone();
                        tokio::spawn(async move { handler.handle(payload).await });
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        state.handlers.insert(id, task);
        Ok(id)
    }

    /// Remove a single handler, or every handler on `channel` if `id` is `None`.
    pub async fn unsubscribe(&self, channel: &str, id: Option<HandlerId>) {
        let channel = canonicalize_channel(channel);
        let mut channels = self.channels.lock().await;
        let Some(state) = channels.get_mut(&channel) else { return };
        match id {
            Some(id) => {
                if let Some(task) = state.handlers.remove(&id) {
                    task.abort();
                }
            }
            None => {
                for (_, task) in state.handlers.drain() {
                    task.abort();
                }
            }
        }
        if state.handlers.is_empty() {
            channels.remove(&channel);
        }
    }

    /// Drain and release all channel resources. Further `publish`/`subscribe`
    /// calls fail with [`PubSubError::ShutDown`].
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let mut channels = self.channels.lock().await;
        for (_, state) in channels.drain() {
            for (_, task) in state.handlers {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "pubsub_tests.rs"]
mod tests;
