// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use lugh_core::{ConversationId, PoolTask};
use lugh_wire::{Query, Response};

use super::*;
use crate::test_support::client_expecting;

fn sample_task() -> PoolTask {
    PoolTask::new(ConversationId::new(), "run_agent", 3, serde_json::json!({"prompt": "hi"}), 1_000)
}

#[tokio::test]
async fn list_renders_queued_tasks() {
    let (mut client, server, _dir) =
        client_expecting(Query::ListQueuedTasks, Response::Tasks(vec![sample_task()])).await;

    handle(TaskCommand::List, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_renders_a_found_task_including_its_error() {
    let mut task = sample_task();
    task.error = Some("agent crashed".into());
    let id = task.id.to_string();
    let (mut client, server, _dir) = client_expecting(Query::GetTask { id: id.clone() }, Response::Task(task)).await;

    handle(TaskCommand::Show { id }, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_returns_not_found_as_an_exit_error() {
    let id = "ptsk_missing".to_string();
    let (mut client, server, _dir) = client_expecting(Query::GetTask { id: id.clone() }, Response::NotFound).await;

    let err = handle(TaskCommand::Show { id }, &mut client, OutputFormat::Json).await.unwrap_err();
    let exit_err = err.downcast::<crate::exit_error::ExitError>().unwrap();
    assert_eq!(exit_err.code, 1);

    server.await.unwrap();
}
