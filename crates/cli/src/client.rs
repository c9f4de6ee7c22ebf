// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket client for `lugh-wire` queries against a running orchestrator.

use std::path::Path;

use lugh_wire::{decode, encode, read_message, write_message, ProtocolError, Query, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {path}: {source}")]
    Connect { path: String, #[source] source: std::io::Error },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One connection to whatever process is listening on the `lugh-wire` socket.
///
/// This workspace doesn't ship a resident daemon binary — `lugh-wire`'s
/// framing is for whatever process hosts the orchestrator in a given
/// deployment. A fresh connection per query keeps this client stateless and
/// matches how short-lived CLI invocations are expected to use it.
pub struct LughClient {
    stream: UnixStream,
}

impl LughClient {
    pub async fn connect(path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| ClientError::Connect { path: path.display().to_string(), source })?;
        Ok(Self { stream })
    }

    pub async fn query(&mut self, query: Query) -> Result<Response, ClientError> {
        let payload = encode(&query)?;
        write_message(&mut self.stream, &payload).await?;
        let reply = read_message(&mut self.stream).await?;
        Ok(decode(&reply)?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
