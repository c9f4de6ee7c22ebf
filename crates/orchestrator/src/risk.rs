// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool risk classification (spec §4.8 step 8, §6.5 Approval, GLOSSARY
//! "High-risk tool"). Not a sandbox: it decides whether a tool invocation
//! gets logged as an approval row before it runs, not whether it's allowed
//! to.

use lugh_core::RiskLevel;

/// The glossary's fixed high-risk tool set. Every invocation of one of
/// these must be audited, regardless of what it's doing.
const HIGH_RISK_TOOL_NAMES: &[&str] = &["write", "edit", "multiedit", "bash", "todowrite"];

/// Substrings that make a `Bash` command high-risk outright.
const DANGEROUS_BASH_SUBSTRINGS: &[&str] = &["rm -rf", "sudo", "chmod", "chown", "> /dev/", "dd if="];

const HIGH_RISK_KEYWORDS: &[&str] =
    &["delete", "rm", "drop", "force_push", "force-push", "reset_hard", "reset-hard", "shell", "exec"];

const MEDIUM_RISK_KEYWORDS: &[&str] = &["write", "edit", "commit", "push"];

/// Classify a tool invocation. The glossary's fixed set (`Write`, `Edit`,
/// `MultiEdit`, `Bash`, `TodoWrite`) is always audited; a `Bash` command
/// containing one of the named dangerous substrings escalates to `High`.
/// Tool names outside that fixed set fall back to a generic keyword scan.
pub fn classify_tool_risk(tool_name: &str, tool_input: &serde_json::Value) -> RiskLevel {
    let lowered = tool_name.to_lowercase();

    if lowered == "bash" {
        let is_dangerous = tool_input
            .get("command")
            .and_then(|v| v.as_str())
            .map(|command| {
                let command = command.to_lowercase();
                DANGEROUS_BASH_SUBSTRINGS.iter().any(|kw| command.contains(kw))
            })
            .unwrap_or(false);
        return if is_dangerous { RiskLevel::High } else { RiskLevel::Medium };
    }

    if HIGH_RISK_TOOL_NAMES.contains(&lowered.as_str()) {
        return RiskLevel::Medium;
    }

    if HIGH_RISK_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return RiskLevel::High;
    }
    if MEDIUM_RISK_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}

#[cfg(test)]
#[path = "risk_tests.rs"]
mod tests;
