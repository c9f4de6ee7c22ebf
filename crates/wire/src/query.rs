// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query types for reading orchestrator state, used by the ops CLI.

use serde::{Deserialize, Serialize};

/// Read-only queries against the persisted store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    StatusOverview,

    ListConversations {
        #[serde(default)]
        platform: Option<String>,
    },
    GetConversation {
        id: String,
    },

    ListCodebases,
    GetCodebase {
        id: String,
    },

    ListIsolationEnvs {
        #[serde(default)]
        codebase_id: Option<String>,
        #[serde(default)]
        active_only: bool,
    },
    GetIsolationEnv {
        id: String,
    },

    ListAgents {
        #[serde(default)]
        status: Option<String>,
    },
    GetAgent {
        agent_id: String,
    },

    ListQueuedTasks,
    GetTask {
        id: String,
    },
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
