// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use lugh_wire::{read_query, write_response};
use tokio::net::UnixListener;

use super::*;

#[tokio::test]
async fn query_round_trips_through_the_socket() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("lugh.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let query = read_query(&mut stream).await.unwrap();
        assert_eq!(query, Query::StatusOverview);
        write_response(
            &mut stream,
            &Response::Status(lugh_wire::StatusSummary {
                conversations: 1,
                active_sessions: 0,
                codebases: 2,
                active_isolation_envs: 0,
                idle_agents: 3,
                busy_agents: 0,
                queued_tasks: 0,
            }),
        )
        .await
        .unwrap();
    });

    let mut client = LughClient::connect(&socket_path).await.unwrap();
    let response = client.query(Query::StatusOverview).await.unwrap();
    match response {
        Response::Status(summary) => {
            assert_eq!(summary.codebases, 2);
            assert_eq!(summary.idle_agents, 3);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    server.await.unwrap();
}

#[tokio::test]
async fn connect_fails_cleanly_when_nothing_is_listening() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("nobody-here.sock");

    let err = LughClient::connect(&socket_path).await.unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }));
}
