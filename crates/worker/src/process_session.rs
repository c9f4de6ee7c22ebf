// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete `AssistantSession` backed by an external assistant CLI,
//! spawned per query and read as newline-delimited JSON (spec §6.2 Event
//! shape) — one process per prompt, `tokio::process::Command` only, no
//! shell involved in the invocation itself.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use lugh_adapters::{AssistantEvent, AssistantSession, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Spawns `{command} {args...} {prompt}` (plus `--resume {handle}` when
/// resuming) and parses each stdout line as an [`AssistantEvent`]. Lines
/// that fail to parse are logged and skipped rather than failing the
/// whole query — a malformed progress line shouldn't sink a session that
/// still ends with a valid `result` event.
pub struct ProcessAssistantSession {
    command: PathBuf,
    args: Vec<String>,
}

impl ProcessAssistantSession {
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { command: command.into(), args }
    }
}

#[async_trait]
impl AssistantSession for ProcessAssistantSession {
    async fn send_query(
        &self,
        prompt: &str,
        cwd: &Path,
        previous_session_handle: Option<&str>,
    ) -> Result<mpsc::Receiver<AssistantEvent>, SessionError> {
        let mut command = Command::new(&self.command);
        command.args(&self.args).arg(prompt).current_dir(cwd).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(handle) = previous_session_handle {
            command.arg("--resume").arg(handle);
        }

        let mut child = command.spawn().map_err(|err| SessionError::Backend(err.to_string()))?;
        let stdout =
            child.stdout.take().ok_or_else(|| SessionError::Backend("assistant process has no stdout".to_string()))?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<AssistantEvent>(&line) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => warn!(%err, line, "unparseable assistant event line"),
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(%err, "error reading assistant stdout");
                        break;
                    }
                }
            }
            if let Err(err) = child.wait().await {
                debug!(%err, "assistant process wait failed");
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
#[path = "process_session_tests.rs"]
mod tests;
