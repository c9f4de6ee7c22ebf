// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coarse, keyword-based classifiers for recovery summaries (spec §4.7).
//!
//! These are intentionally simple substring matchers, not a real parser —
//! the spec asks for a "coarse classifier", and the inputs are free-form
//! error/result text from an assistant session, not a structured format.

/// Classify an error message into one of the spec's recurring failure
/// pattern buckets.
pub fn classify_error(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("syntaxerror") || lower.contains("syntax error") || lower.contains("unexpected token") {
        "syntax_error".to_string()
    } else if lower.contains("typeerror") || lower.contains("type error") || lower.contains("type mismatch") {
        "type_error".to_string()
    } else if lower.contains("importerror") || lower.contains("modulenotfounderror") || lower.contains("cannot find module") || lower.contains("no module named") {
        "import_error".to_string()
    } else if lower.contains("assertionerror") || lower.contains("test failed") || lower.contains("tests failed") || lower.contains("assertion failed") {
        "test_failure".to_string()
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "timeout".to_string()
    } else {
        "unknown".to_string()
    }
}

/// Classify a result summary into a coarse "approach" tag, used to build
/// the `what_to_avoid` list.
pub fn classify_approach(summary: &str) -> Option<String> {
    let lower = summary.to_lowercase();
    if lower.contains("refactor") {
        Some("refactoring".to_string())
    } else if lower.contains("created") || lower.contains("new file") || lower.contains("added file") {
        Some("create_new_files".to_string())
    } else if lower.contains("modified") || lower.contains("edited") || lower.contains("updated") {
        Some("modify_existing".to_string())
    } else {
        None
    }
}
