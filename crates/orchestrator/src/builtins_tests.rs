// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use lugh_adapters::{ChatAdapter, FakeAssistantSession, FakeChatAdapter, FakeNotifyAdapter, StreamingMode};
use lugh_core::{ConversationKey, FakeClock, PlatformType};
use lugh_isolation::{FakeWorktreeProvider, IsolationManager};
use lugh_pool::PoolCoordinator;
use lugh_pubsub::PubSub;
use lugh_queue::Queue;
use lugh_registry::Registry;
use lugh_storage::Store;
use tempfile::TempDir;
use tokio::sync::Mutex;

use super::*;

fn harness() -> (Orchestrator<FakeChatAdapter, FakeAssistantSession, FakeNotifyAdapter, FakeClock>, TempDir, TempDir) {
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
    let adapter = Arc::new(FakeChatAdapter::new("slack", StreamingMode::Batch));
    let session = Arc::new(FakeAssistantSession::scripted(vec![]));
    let notifier = FakeNotifyAdapter::new();

    let orchestrator = Orchestrator::new(
        store,
        isolation,
        pool,
        session,
        adapter,
        notifier,
        clock,
        workspace.path().to_path_buf(),
        "main",
    );
    (orchestrator, state_dir, workspace)
}

async fn conversation(orchestrator: &Orchestrator<FakeChatAdapter, FakeAssistantSession, FakeNotifyAdapter, FakeClock>) -> Conversation {
    let req = IncomingMessage::new(ConversationKey::new(PlatformType::Slack, "c1"), "claude", "/help");
    orchestrator.load_or_create_conversation(&req, 1000).await.unwrap()
}

#[tokio::test]
async fn cloning_the_same_remote_twice_does_not_duplicate_the_codebase() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;
    let remote = tempfile::tempdir().unwrap();
    std::process::Command::new("git").arg("init").current_dir(remote.path()).output().unwrap();
    std::process::Command::new("git").args(["config", "user.email", "a@b.c"]).current_dir(remote.path()).output().unwrap();
    std::process::Command::new("git").args(["config", "user.name", "a"]).current_dir(remote.path()).output().unwrap();
    std::process::Command::new("git")
        .args(["commit", "--allow-empty", "-m", "init"])
        .current_dir(remote.path())
        .output()
        .unwrap();
    let url = remote.path().to_string_lossy().into_owned();
    let args = vec![format!("{url}")];

    let first = orchestrator.run_builtin(&conv, "clone", &args, 1000).await.unwrap();
    assert!(first.success);
    assert!(first.modified);

    let second = orchestrator.run_builtin(&conv, "clone", &args, 2000).await.unwrap();
    assert!(second.success);
    assert!(second.message.contains("already cloned"));

    let store = orchestrator.store.lock().await;
    assert_eq!(store.state().codebases.len(), 1);
}

#[tokio::test]
async fn template_add_list_and_delete_round_trip() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let add = orchestrator
        .run_builtin(&conv, "template-add", &["greeting".to_string(), "hello".to_string(), "there".to_string()], 1000)
        .await
        .unwrap();
    assert!(add.success);

    let list = orchestrator.run_builtin(&conv, "template-list", &[], 1000).await.unwrap();
    assert!(list.message.contains("greeting"));

    let delete = orchestrator.run_builtin(&conv, "template-delete", &["greeting".to_string()], 1000).await.unwrap();
    assert!(delete.success);

    let list_after = orchestrator.run_builtin(&conv, "template-list", &[], 1000).await.unwrap();
    assert!(!list_after.message.contains("greeting"));
}

#[tokio::test]
async fn deleting_an_unknown_template_fails() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let outcome = orchestrator.run_builtin(&conv, "template-delete", &["nope".to_string()], 1000).await.unwrap();
    assert!(!outcome.success);
}

#[tokio::test]
async fn reset_deactivates_the_session_but_keeps_the_codebase() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let outcome = orchestrator.run_builtin(&conv, "reset", &[], 1000).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.modified);
}

#[tokio::test]
async fn reset_context_also_unbinds_the_codebase() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let outcome = orchestrator.run_builtin(&conv, "reset-context", &[], 1000).await.unwrap();
    assert!(outcome.success);

    let store = orchestrator.store.lock().await;
    let refreshed = store.state().conversations.get(conv.id.as_str()).unwrap();
    assert!(refreshed.codebase_id.is_none());
}

#[tokio::test]
async fn setcwd_rejects_a_path_outside_the_workspace() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let outcome = orchestrator.run_builtin(&conv, "setcwd", &["/etc/passwd".to_string()], 1000).await.unwrap();
    assert!(!outcome.success);
}

#[tokio::test]
async fn setcwd_accepts_a_path_within_the_workspace() {
    let (orchestrator, _state, workspace) = harness();
    let conv = conversation(&orchestrator).await;
    let inside = workspace.path().join("sub").to_string_lossy().into_owned();

    let outcome = orchestrator.run_builtin(&conv, "setcwd", &[inside], 1000).await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn stop_with_nothing_running_reports_a_no_op() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;

    let outcome = orchestrator.run_builtin(&conv, "stop", &[], 1000).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.message.contains("nothing to stop"));
    assert!(outcome.follow_up_prompt.is_none());
}

#[tokio::test]
async fn stop_with_a_handle_installed_reports_success() {
    let (orchestrator, _state, _workspace) = harness();
    let conv = conversation(&orchestrator).await;
    orchestrator.aborts.install(conv.id.clone()).await;

    let outcome = orchestrator.run_builtin(&conv, "stop", &[], 1000).await.unwrap();
    assert!(outcome.message.contains("stopping"));
    assert!(outcome.follow_up_prompt.unwrap().contains("stop"));
}
