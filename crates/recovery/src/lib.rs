// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-recovery: per-task attempt history and escalation (spec §4.7 C7).
//!
//! Tracks failed attempts per task in memory; below `MAX_ATTEMPTS` it hands
//! the caller a [`RecoveryContext`] summarizing what went wrong so far, at
//! or above it hands the configured [`EscalationHandler`] an [`Escalation`]
//! and stops retrying.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod classify;

pub use classify::{classify_error, classify_approach};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lugh_core::AgentId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// Default attempt budget before a task is escalated instead of retried.
pub const MAX_ATTEMPTS: u32 = 3;

/// The outcome of a single check run as part of a verification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// An optional structured verification pass attached to a failure report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verification {
    pub checks: Vec<CheckResult>,
}

impl Verification {
    pub fn failing(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// One recorded attempt at a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureAttempt {
    pub description: String,
    pub agent_id: Option<AgentId>,
    pub result: serde_json::Value,
    pub verification: Option<Verification>,
    pub at_ms: u64,
}

/// Returned when the caller should retry: the attempt number about to be
/// made, and summaries of what has already gone wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryContext {
    pub attempt_number: u32,
    pub previous_attempts: Vec<FailureAttempt>,
    pub recovery_hints: Vec<String>,
    pub what_to_avoid: Vec<String>,
    pub failure_patterns: Vec<String>,
}

/// Returned when the caller should stop retrying and escalate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub task_id: String,
    pub description: String,
    pub attempts: Vec<FailureAttempt>,
    pub reason: String,
    pub suggested_actions: Vec<String>,
}

/// Decision returned by [`RecoveryManager::handle_failure`].
#[derive(Debug, Clone)]
pub enum Outcome {
    Retry(RecoveryContext),
    Escalate(Escalation),
}

/// Invoked once a task has exhausted its attempt budget.
#[async_trait]
pub trait EscalationHandler: Send + Sync + 'static {
    async fn escalate(&self, escalation: Escalation);
}

/// An escalation handler that only logs, for setups with no human-in-the-loop
/// channel configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEscalationHandler;

#[async_trait]
impl EscalationHandler for LoggingEscalationHandler {
    async fn escalate(&self, escalation: Escalation) {
        warn!(
            task_id = %escalation.task_id,
            reason = %escalation.reason,
            attempts = escalation.attempts.len(),
            "task escalated after exhausting retry budget"
        );
    }
}

/// Per-task failure history and retry/escalation decisions.
pub struct RecoveryManager {
    max_attempts: u32,
    history: Mutex<HashMap<String, Vec<FailureAttempt>>>,
    escalation_handler: Arc<dyn EscalationHandler>,
}

impl RecoveryManager {
    pub fn new(escalation_handler: Arc<dyn EscalationHandler>) -> Self {
        Self::with_max_attempts(MAX_ATTEMPTS, escalation_handler)
    }

    pub fn with_max_attempts(max_attempts: u32, escalation_handler: Arc<dyn EscalationHandler>) -> Self {
        Self { max_attempts, history: Mutex::new(HashMap::new()), escalation_handler }
    }

    /// Record a failed attempt and decide whether to retry or escalate.
    pub async fn handle_failure(
        &self,
        task_id: &str,
        description: &str,
        agent_id: Option<AgentId>,
        result: serde_json::Value,
        verification: Option<Verification>,
        now_ms: u64,
    ) -> Outcome {
        let attempt = FailureAttempt { description: description.to_string(), agent_id, result, verification, at_ms: now_ms };

        let mut history = self.history.lock().await;
        let attempts = history.entry(task_id.to_string()).or_default();
        attempts.push(attempt);
        let attempts = attempts.clone();

        if (attempts.len() as u32) < self.max_attempts {
            let context = RecoveryContext {
                attempt_number: attempts.len() as u32 + 1,
                recovery_hints: recovery_hints(&attempts),
                what_to_avoid: what_to_avoid(&attempts),
                failure_patterns: recurring_patterns(&attempts),
                previous_attempts: attempts,
            };
            Outcome::Retry(context)
        } else {
            let patterns = recurring_patterns(&attempts);
            let escalation = Escalation {
                task_id: task_id.to_string(),
                description: description.to_string(),
                reason: format!("exhausted {} attempts", attempts.len()),
                suggested_actions: suggested_actions(&patterns),
                attempts,
            };
            drop(history);
            self.escalation_handler.escalate(escalation.clone()).await;
            Outcome::Escalate(escalation)
        }
    }

    /// Drop all recorded history for a task, on success or manual intervention.
    pub async fn clear_history(&self, task_id: &str) {
        self.history.lock().await.remove(task_id);
    }

    pub async fn attempt_count(&self, task_id: &str) -> usize {
        self.history.lock().await.get(task_id).map(Vec::len).unwrap_or(0)
    }
}

fn recovery_hints(attempts: &[FailureAttempt]) -> Vec<String> {
    attempts
        .iter()
        .map(|attempt| {
            if let Some(verification) = &attempt.verification {
                let failing: Vec<String> = verification
                    .failing()
                    .map(|c| match &c.detail {
                        Some(detail) => format!("{}: {}", c.name, detail),
                        None => c.name.clone(),
                    })
                    .collect();
                if !failing.is_empty() {
                    return failing.join("; ");
                }
            }
            first_line(&error_text(attempt))
        })
        .collect()
}

fn what_to_avoid(attempts: &[FailureAttempt]) -> Vec<String> {
    let mut tags: Vec<String> = attempts.iter().filter_map(|a| classify_approach(&result_summary(a))).collect();
    tags.dedup();
    tags
}

fn recurring_patterns(attempts: &[FailureAttempt]) -> Vec<String> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for attempt in attempts {
        for pattern in patterns_for_attempt(attempt) {
            *counts.entry(pattern).or_insert(0) += 1;
        }
    }
    let mut recurring: Vec<String> = counts.into_iter().filter(|(_, n)| *n >= 2).map(|(pattern, _)| pattern).collect();
    recurring.sort();
    recurring
}

fn patterns_for_attempt(attempt: &FailureAttempt) -> Vec<String> {
    if let Some(verification) = &attempt.verification {
        let failing: Vec<String> = verification.failing().map(|c| c.name.clone()).collect();
        if !failing.is_empty() {
            return failing;
        }
    }
    vec![classify_error(&error_text(attempt))]
}

fn suggested_actions(patterns: &[String]) -> Vec<String> {
    let mut actions = Vec::new();
    for pattern in patterns {
        let action = match pattern.as_str() {
            "syntax_error" => Some("run a linter or syntax check before retrying"),
            "type_error" => Some("double-check type signatures and call sites"),
            "import_error" => Some("verify import paths and package availability"),
            "test_failure" => Some("run the failing test locally and inspect its output"),
            "timeout" => Some("break the task into smaller steps"),
            _ => None,
        };
        if let Some(action) = action {
            actions.push(action.to_string());
        }
    }
    actions.push("simplify".to_string());
    actions.push("be more specific".to_string());
    actions.push("complete manually".to_string());
    actions
}

fn error_text(attempt: &FailureAttempt) -> String {
    attempt
        .result
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| attempt.description.clone())
}

fn result_summary(attempt: &FailureAttempt) -> String {
    attempt.result.get("summary").and_then(|v| v.as_str()).map(str::to_string).unwrap_or_else(|| attempt.description.clone())
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or(text).to_string()
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
