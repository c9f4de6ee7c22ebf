// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lugh_adapters::{FakeAssistantSession, FakeChatAdapter, FakeNotifyAdapter, SessionError, StreamingMode};
use lugh_core::{ConversationKey, FakeClock, PlatformType};
use lugh_isolation::{FakeWorktreeProvider, IsolationManager};
use lugh_pool::PoolCoordinator;
use lugh_pubsub::PubSub;
use lugh_queue::Queue;
use lugh_registry::Registry;
use lugh_storage::Store;
use tempfile::TempDir;
use tokio::sync::{mpsc, Mutex};

use super::*;

fn harness<S: AssistantSession>(
    adapter: FakeChatAdapter,
    session: S,
) -> (Orchestrator<FakeChatAdapter, S, FakeNotifyAdapter, FakeClock>, TempDir, TempDir) {
    let state_dir = tempfile::tempdir().unwrap();
    let workspace = tempfile::tempdir().unwrap();
    let store = Arc::new(Mutex::new(Store::open(state_dir.path()).unwrap()));
    let queue = Arc::new(Queue::new(store.clone()));
    let registry = Arc::new(Registry::new(store.clone()));
    let pubsub = Arc::new(PubSub::new());
    let clock = FakeClock::new();
    let pool = Arc::new(PoolCoordinator::new(queue, registry, pubsub, clock.clone()));
    let provider = Arc::new(FakeWorktreeProvider::new());
    let isolation = Arc::new(IsolationManager::new(store.clone(), provider, workspace.path().to_path_buf()));

    let orchestrator = Orchestrator::new(
        store,
        isolation,
        pool,
        Arc::new(session),
        Arc::new(adapter),
        FakeNotifyAdapter::new(),
        clock,
        workspace.path().to_path_buf(),
        "main",
    );
    (orchestrator, state_dir, workspace)
}

#[tokio::test]
async fn executing_after_planning_starts_a_fresh_session() {
    let adapter = FakeChatAdapter::new("slack", StreamingMode::Batch);
    let session = FakeAssistantSession::scripted(vec![AssistantEvent::Result { session_id: "s1".to_string() }]);
    let (orchestrator, _state, _workspace) = harness(adapter, session);
    let key = ConversationKey::new(PlatformType::Slack, "thread-1");

    let conv = orchestrator.load_or_create_conversation(&IncomingMessage::new(key.clone(), "claude", "seed"), 1000).await.unwrap();
    orchestrator
        .run_builtin(&conv, "template-add", &["plan-feature".to_string(), "plan it".to_string()], 1000)
        .await
        .unwrap();
    orchestrator.run_builtin(&conv, "template-add", &["execute".to_string(), "execute it".to_string()], 1000).await.unwrap();

    let plan = IncomingMessage::new(key.clone(), "claude", "/plan-feature");
    orchestrator.handle_message(plan, 2000).await.unwrap();

    let first_session_id = {
        let store = orchestrator.store.lock().await;
        let session = store.state().active_session_for(conv.id.as_str()).unwrap();
        assert_eq!(session.last_command(), Some("plan-feature"));
        session.id.to_string()
    };

    let execute = IncomingMessage::new(key, "claude", "/execute");
    orchestrator.handle_message(execute, 3000).await.unwrap();

    let store = orchestrator.store.lock().await;
    let active = store.state().active_session_for(conv.id.as_str()).unwrap();
    assert_eq!(active.last_command(), Some("execute"));
    assert_ne!(active.id.to_string(), first_session_id);

    let previous = store.state().sessions.get(&first_session_id).unwrap();
    assert!(!previous.active);
}

struct SlowSession;

#[async_trait]
impl AssistantSession for SlowSession {
    async fn send_query(
        &self,
        _prompt: &str,
        _cwd: &Path,
        _previous_session_handle: Option<&str>,
    ) -> Result<mpsc::Receiver<AssistantEvent>, SessionError> {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let _ = tx.send(AssistantEvent::Assistant { content: "working".to_string() }).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = tx.send(AssistantEvent::Result { session_id: "late".to_string() }).await;
        });
        Ok(rx)
    }
}

#[tokio::test]
async fn stopping_mid_stream_interrupts_before_the_result_event() {
    let adapter = FakeChatAdapter::new("slack", StreamingMode::Stream);
    let adapter_handle = adapter.clone();
    let (orchestrator, _state, _workspace) = harness(adapter, SlowSession);
    let key = ConversationKey::new(PlatformType::Slack, "thread-2");

    let conv = orchestrator
        .load_or_create_conversation(&IncomingMessage::new(key.clone(), "claude", "seed"), 1000)
        .await
        .unwrap();

    let orchestrator = Arc::new(orchestrator);
    let background = {
        let orchestrator = orchestrator.clone();
        let msg = IncomingMessage::new(key, "claude", "please look into this");
        tokio::spawn(async move { orchestrator.handle_message(msg, 2000).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stopped = orchestrator.aborts.stop(&conv.id).await;
    assert!(stopped);

    let result = tokio::time::timeout(Duration::from_secs(2), background).await.unwrap().unwrap();
    assert!(result.is_ok());

    let sent = adapter_handle.sent();
    assert!(sent.iter().any(|m| matches!(m, lugh_adapters::SentMessage::Text { text, .. } if text == "working")));
    assert!(sent.iter().any(|m| matches!(m, lugh_adapters::SentMessage::Text { text, .. } if text == "Interrupted.")));

    let store = orchestrator.store.lock().await;
    let session = store.state().active_session_for(conv.id.as_str()).unwrap();
    assert!(session.active);
}

#[tokio::test]
async fn a_conversation_with_no_codebase_skips_isolation_and_uses_the_workspace_base() {
    let adapter = FakeChatAdapter::new("slack", StreamingMode::Batch);
    let session = FakeAssistantSession::scripted(vec![AssistantEvent::Result { session_id: "s1".to_string() }]);
    let (orchestrator, _state, workspace) = harness(adapter, session);
    let key = ConversationKey::new(PlatformType::Slack, "thread-3");

    let msg = IncomingMessage::new(key, "claude", "hello there");
    orchestrator.handle_message(msg, 1000).await.unwrap();

    let store = orchestrator.store.lock().await;
    let conversation = store.state().conversations.values().next().unwrap();
    assert!(conversation.isolation_env_id.is_none());
    let _ = workspace;
}
