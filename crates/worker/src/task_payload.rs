// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoded shape of a pool task's JSON payload, for the one `task_type`
//! this worker knows how to run (spec §9 "dynamic typing": payloads stay
//! free-form JSON at the boundary, decoded only once a field is needed).

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed task payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskPayload {
    pub prompt: String,
    pub cwd: PathBuf,
    #[serde(default)]
    pub previous_session_handle: Option<String>,
}

impl TaskPayload {
    pub fn decode(value: &serde_json::Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[cfg(test)]
#[path = "task_payload_tests.rs"]
mod tests;
