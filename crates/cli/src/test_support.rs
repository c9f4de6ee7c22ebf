// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only helper for spinning up a one-shot `lugh-wire` server, so
//! command handlers can be exercised against canned responses without a
//! real orchestrator.

#![cfg(test)]

use lugh_wire::{read_query, write_response, Query, Response};
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

use crate::client::LughClient;

/// Binds a socket, accepts exactly one connection, asserts the received
/// query equals `expected_query`, replies with `response`, then exits.
/// Returns a connected client plus the server task (await it to make sure
/// the exchange actually happened).
pub async fn client_expecting(expected_query: Query, response: Response) -> (LughClient, JoinHandle<()>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("lugh.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let query = read_query(&mut stream).await.unwrap();
        assert_eq!(query, expected_query);
        write_response(&mut stream, &response).await.unwrap();
    });

    let client = LughClient::connect(&socket_path).await.unwrap();
    (client, server, dir)
}
