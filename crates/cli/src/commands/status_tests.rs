// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use lugh_wire::{Query, Response, StatusSummary};

use super::*;
use crate::test_support::client_expecting;

#[tokio::test]
async fn handle_prints_counts_from_the_status_overview() {
    let summary = StatusSummary {
        conversations: 4,
        active_sessions: 1,
        codebases: 2,
        active_isolation_envs: 1,
        idle_agents: 3,
        busy_agents: 1,
        queued_tasks: 5,
    };
    let (mut client, server, _dir) = client_expecting(Query::StatusOverview, Response::Status(summary)).await;

    handle(&mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn handle_rejects_an_unexpected_response() {
    let (mut client, server, _dir) = client_expecting(Query::StatusOverview, Response::Ok).await;

    let err = handle(&mut client, OutputFormat::Text).await.unwrap_err();
    assert!(err.to_string().contains("unexpected response"));

    server.await.unwrap();
}
