// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standalone agent worker process (spec §4.5 C5, §6.6 `AGENT_POOL_SIZE`).
//!
//! Opens the shared state store and runs `AGENT_POOL_SIZE` workers as
//! in-process tasks against it. This mirrors running a whole pool inside
//! one process rather than one process per agent: the store's WAL and the
//! pub/sub broadcaster both assume a single owning process, so a second
//! `lugh-worker` invocation pointed at the same state directory while this
//! one is running is unsupported, not merely untested.
//!
//! Each worker drives its assistant session by spawning
//! `LUGH_ASSISTANT_COMMAND` (default `lugh-assistant`) per query and
//! reading its stdout as the event stream defined in spec §6.2 — this
//! binary has no bundled assistant backend of its own.

use std::process::ExitCode;
use std::sync::Arc;

use lugh_core::{AgentId, SystemClock};
use lugh_pubsub::PubSub;
use lugh_queue::Queue;
use lugh_recovery::{LoggingEscalationHandler, RecoveryManager};
use lugh_registry::Registry;
use lugh_storage::Store;
use lugh_worker::{env, ProcessAssistantSession, Worker};
use tokio::sync::Mutex;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let Some(state_dir) = env::state_dir() else {
        error!("could not resolve a state directory (set LUGH_STATE_DIR or HOME)");
        return ExitCode::FAILURE;
    };
    if let Err(err) = std::fs::create_dir_all(&state_dir) {
        error!(%err, path = %state_dir.display(), "failed to create state directory");
        return ExitCode::FAILURE;
    }

    let store = match Store::open(&state_dir) {
        Ok(store) => Arc::new(Mutex::new(store)),
        Err(err) => {
            error!(%err, "failed to open store");
            return ExitCode::FAILURE;
        }
    };
    let queue = Arc::new(Queue::new(store.clone()));
    let registry = Arc::new(Registry::new(store));
    let pubsub = Arc::new(PubSub::new());
    // Shared across every in-process worker so a task's attempt history
    // accumulates regardless of which worker picks up the retry.
    let recovery = Arc::new(RecoveryManager::new(Arc::new(LoggingEscalationHandler)));

    let (command, args) = env::assistant_command();
    let session = Arc::new(ProcessAssistantSession::new(command, args));

    let base_id = env::agent_id();
    let capabilities = env::capabilities();
    let pool_size = env::agent_pool_size().max(1);

    let mut workers = Vec::with_capacity(pool_size);
    for index in 0..pool_size {
        let agent_id = if pool_size == 1 { base_id.clone() } else { AgentId::new(format!("{base_id}-{index}")) };
        let worker = Worker::new(
            agent_id.clone(),
            capabilities.clone(),
            queue.clone(),
            registry.clone(),
            pubsub.clone(),
            session.clone(),
            recovery.clone(),
            SystemClock,
        );
        let heartbeat = match worker.start().await {
            Ok(handle) => handle,
            Err(err) => {
                error!(%err, %agent_id, "failed to start worker");
                return ExitCode::FAILURE;
            }
        };
        info!(%agent_id, "worker started");
        workers.push((worker, heartbeat));
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to install ctrl-c handler");
    }
    info!("shutting down");

    for (worker, heartbeat) in workers {
        if let Err(err) = worker.shutdown(heartbeat).await {
            error!(%err, agent_id = %worker.agent_id(), "error during worker shutdown");
        }
    }

    ExitCode::SUCCESS
}
