// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh run` — drive one message through a real, in-process orchestrator
//! without a chat platform or a resident daemon. Useful for exercising a
//! codebase/assistant setup end to end from a terminal.

use std::path::Path;

use async_trait::async_trait;
use clap::Args;
use lugh_adapters::{AdapterError, ChatAdapter, StreamingMode};
use lugh_core::{ConversationKey, PlatformType, SystemClock};
use lugh_isolation::IsolationManager;
use lugh_orchestrator::{IncomingMessage, Orchestrator};
use lugh_pool::PoolCoordinator;
use lugh_pubsub::PubSub;
use lugh_queue::Queue;
use lugh_registry::Registry;
use lugh_storage::Store;
use lugh_worker::ProcessAssistantSession;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Args)]
pub struct RunArgs {
    /// Conversation id to address (an arbitrary stable string; re-running with
    /// the same id resumes the same conversation)
    pub conversation_id: String,
    /// Assistant kind passed through to the session backend
    #[arg(long, default_value = "claude")]
    pub assistant_kind: String,
    /// Message text, as if typed in the chat platform
    pub text: String,
}

/// Prints outbound messages to stdout instead of a real chat platform.
struct StdoutChatAdapter;

#[async_trait]
impl ChatAdapter for StdoutChatAdapter {
    fn platform_type(&self) -> &'static str {
        "cli"
    }

    fn streaming_mode(&self) -> StreamingMode {
        StreamingMode::Stream
    }

    async fn send_message(&self, _conversation_id: &str, text: &str) -> Result<(), AdapterError> {
        println!("{text}");
        Ok(())
    }

    async fn send_file(&self, _conversation_id: &str, path: &Path, caption: Option<&str>) -> Result<(), AdapterError> {
        match caption {
            Some(caption) => println!("[file: {} — {caption}]", path.display()),
            None => println!("[file: {}]", path.display()),
        }
        Ok(())
    }
}

pub async fn handle(args: RunArgs) -> anyhow::Result<()> {
    let state_dir = crate::env::state_dir().ok_or_else(|| anyhow::anyhow!("cannot resolve a state directory"))?;
    std::fs::create_dir_all(&state_dir)?;
    let store = Arc::new(Mutex::new(Store::open(&state_dir)?));

    let queue = Arc::new(Queue::new(store.clone()));
    let registry = Arc::new(Registry::new(store.clone()));
    let pubsub = Arc::new(PubSub::new());
    let clock = SystemClock;
    let pool = Arc::new(PoolCoordinator::new(queue, registry, pubsub, clock.clone()));

    let provider = Arc::new(lugh_isolation::GitWorktreeProvider);
    let workspace_base = crate::env::workspace_path();
    std::fs::create_dir_all(&workspace_base)?;
    let isolation = Arc::new(IsolationManager::new(store.clone(), provider, workspace_base.clone()));

    let (command, command_args) = lugh_worker::env::assistant_command();
    let session = Arc::new(ProcessAssistantSession::new(command, command_args));
    let adapter = Arc::new(StdoutChatAdapter);
    let notifier = lugh_adapters::notify::DesktopNotifyAdapter::new();

    let orchestrator =
        Orchestrator::new(store, isolation, pool, session, adapter, notifier, clock, workspace_base, "main");

    run_one_message(&orchestrator, args.conversation_id, args.assistant_kind, args.text).await
}

/// Drives a single message through an already-built orchestrator. Split out
/// from [`handle`] so the dispatch logic can run against fakes in tests
/// without spawning a real assistant process or touching the desktop
/// notification center.
async fn run_one_message<A, S, N, C>(
    orchestrator: &Orchestrator<A, S, N, C>,
    conversation_id: String,
    assistant_kind: String,
    text: String,
) -> anyhow::Result<()>
where
    A: ChatAdapter,
    S: lugh_adapters::AssistantSession,
    N: lugh_adapters::NotifyAdapter,
    C: lugh_core::Clock,
{
    let now_ms =
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
    let key = ConversationKey::new(PlatformType::Cli, conversation_id);
    let message = IncomingMessage::new(key, assistant_kind, text);
    orchestrator.handle_message(message, now_ms).await?;
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
