// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lugh_core::ConversationId;
use lugh_storage::Event;
use tempfile::tempdir;

async fn new_queue() -> (Queue, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (Queue::new(Arc::new(Mutex::new(store))), dir)
}

#[tokio::test]
async fn enqueue_then_dequeue_returns_the_task() {
    let (queue, _dir) = new_queue().await;
    let id = queue.enqueue(ConversationId::new(), "run_command", 5, serde_json::json!({}), 1000).await.unwrap();

    let task = queue.dequeue(AgentId::new("a1"), 2000).await.unwrap().unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.assigned_agent_id, Some(AgentId::new("a1")));
}

#[tokio::test]
async fn dequeue_on_empty_queue_returns_none() {
    let (queue, _dir) = new_queue().await;
    assert!(queue.dequeue(AgentId::new("a1"), 1000).await.unwrap().is_none());
}

#[tokio::test]
async fn dequeue_prefers_lower_priority_number() {
    // Priority 1 always precedes priority 10, regardless of age (spec §4.2).
    let (queue, _dir) = new_queue().await;
    let conv = ConversationId::new();
    let less_urgent = queue.enqueue(conv, "run", 9, serde_json::json!({}), 1000).await.unwrap();
    let urgent = queue.enqueue(conv, "run", 2, serde_json::json!({}), 1000).await.unwrap();

    let first = queue.dequeue(AgentId::new("a1"), 2000).await.unwrap().unwrap();
    assert_eq!(first.id, urgent);

    let second = queue.dequeue(AgentId::new("a2"), 2000).await.unwrap().unwrap();
    assert_eq!(second.id, less_urgent);
}

#[tokio::test]
async fn complete_frees_the_assigned_agent() {
    let (queue, _dir) = new_queue().await;
    {
        let mut store = queue.store.lock().await;
        let agent = lugh_core::Agent::new(AgentId::new("a1"), vec![], 1000);
        store.apply(Event::AgentRegistered { agent }).unwrap();
    }

    let id = queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();
    queue.complete(&id.to_string(), serde_json::json!({"ok": true}), 3000).await.unwrap();

    let store = queue.store.lock().await;
    let agent = &store.state().agents["a1"];
    assert!(agent.invariant_holds());
    assert!(agent.current_task_id.is_none());
}

#[tokio::test]
async fn mark_running_transitions_status() {
    let (queue, _dir) = new_queue().await;
    let id = queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();
    queue.mark_running(&id.to_string()).await.unwrap();

    let store = queue.store.lock().await;
    assert_eq!(store.state().pool_tasks[&id.to_string()].status, lugh_core::TaskStatus::Running);
}

#[tokio::test]
async fn cancel_fails_a_running_task_but_is_a_no_op_once_completed() {
    let (queue, _dir) = new_queue().await;
    let id = queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();
    queue.cancel(&id.to_string(), "user requested", 3000).await.unwrap();

    {
        let store = queue.store.lock().await;
        let task = &store.state().pool_tasks[&id.to_string()];
        assert_eq!(task.status, lugh_core::TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("user requested"));
    }

    // Cancelling an already-terminal task does nothing.
    queue.cancel(&id.to_string(), "too late", 4000).await.unwrap();
    let store = queue.store.lock().await;
    assert_eq!(store.state().pool_tasks[&id.to_string()].error.as_deref(), Some("user requested"));
}

#[tokio::test]
async fn add_result_appends_without_changing_status() {
    let (queue, _dir) = new_queue().await;
    let id = queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();

    queue.add_result(id, 0, lugh_core::ChunkType::Chunk, serde_json::json!({"text": "a"}), 2100).await.unwrap();
    queue.add_result(id, 1, lugh_core::ChunkType::Chunk, serde_json::json!({"text": "b"}), 2200).await.unwrap();

    let chunks = queue.get_results(&id.to_string()).await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].sequence, 0);
    assert_eq!(chunks[1].sequence, 1);

    let store = queue.store.lock().await;
    assert_eq!(store.state().pool_tasks[&id.to_string()].status, lugh_core::TaskStatus::Assigned);
}

#[tokio::test]
async fn get_stats_counts_tasks_per_status() {
    let (queue, _dir) = new_queue().await;
    let conv = ConversationId::new();
    queue.enqueue(conv, "run", 5, serde_json::json!({}), 1000).await.unwrap();
    let running = queue.enqueue(conv, "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();

    let stats = queue.get_stats().await;
    assert_eq!(stats.queued, 1);
    assert_eq!(stats.assigned, 1);
    assert_eq!(stats.running, 0);
    let _ = running;
}

#[tokio::test]
async fn reassign_stuck_requeues_tasks_past_the_runtime_threshold_and_frees_the_agent() {
    let (queue, _dir) = new_queue().await;
    {
        let mut store = queue.store.lock().await;
        let agent = lugh_core::Agent::new(AgentId::new("a1"), vec![], 1000);
        store.apply(Event::AgentRegistered { agent }).unwrap();
    }
    let id = queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();

    let reassigned = queue.reassign_stuck(300, 2000 + 301_000).await.unwrap();
    assert_eq!(reassigned, 1);

    let store = queue.store.lock().await;
    let task = &store.state().pool_tasks[&id.to_string()];
    assert_eq!(task.status, lugh_core::TaskStatus::Queued);
    assert!(task.assigned_agent_id.is_none());
    assert!(store.state().agents["a1"].current_task_id.is_none());
}

#[tokio::test]
async fn reassign_stuck_leaves_fresh_tasks_alone() {
    let (queue, _dir) = new_queue().await;
    queue.enqueue(ConversationId::new(), "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();

    let reassigned = queue.reassign_stuck(300, 2000 + 1000).await.unwrap();
    assert_eq!(reassigned, 0);
}

#[tokio::test]
async fn depth_counts_only_queued_tasks() {
    let (queue, _dir) = new_queue().await;
    let conv = ConversationId::new();
    queue.enqueue(conv, "run", 5, serde_json::json!({}), 1000).await.unwrap();
    queue.enqueue(conv, "run", 5, serde_json::json!({}), 1000).await.unwrap();
    assert_eq!(queue.depth().await, 2);

    queue.dequeue(AgentId::new("a1"), 2000).await.unwrap();
    assert_eq!(queue.depth().await, 1);
}
