// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit trail row for a high-risk tool execution (spec §4.8 step 8, §6.5
//! "Approval (audit trail for high-risk tool executions)").

use serde::{Deserialize, Serialize};

use crate::conversation::ConversationId;

crate::define_id! {
    /// Internal identifier for an Approval row.
    pub struct ApprovalId("appr");
}

/// How dangerous a tool invocation is judged to be, gating
/// `NOTIFY_ON_RISK_TOOLS`/`BLOCKING_APPROVALS` (spec §6.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// One recorded high-risk tool call, kept regardless of whether the run
/// that produced it succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub id: ApprovalId,
    pub conversation_id: ConversationId,
    pub tool_name: String,
    pub risk_level: RiskLevel,
    pub input_summary: String,
    pub created_at_ms: u64,
}

impl Approval {
    pub fn new(
        conversation_id: ConversationId,
        tool_name: impl Into<String>,
        risk_level: RiskLevel,
        input_summary: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            conversation_id,
            tool_name: tool_name.into(),
            risk_level,
            input_summary: input_summary.into(),
            created_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
