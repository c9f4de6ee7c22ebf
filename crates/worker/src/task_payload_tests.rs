// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn decodes_a_minimal_payload() {
    let value = serde_json::json!({ "prompt": "fix the bug", "cwd": "/repo" });
    let payload = TaskPayload::decode(&value).unwrap();
    assert_eq!(payload.prompt, "fix the bug");
    assert_eq!(payload.cwd, PathBuf::from("/repo"));
    assert!(payload.previous_session_handle.is_none());
}

#[test]
fn decodes_a_resumed_session_handle() {
    let value = serde_json::json!({
        "prompt": "continue",
        "cwd": "/repo",
        "previous_session_handle": "sess-123",
    });
    let payload = TaskPayload::decode(&value).unwrap();
    assert_eq!(payload.previous_session_handle.as_deref(), Some("sess-123"));
}

#[test]
fn rejects_a_payload_missing_required_fields() {
    let value = serde_json::json!({ "cwd": "/repo" });
    assert!(TaskPayload::decode(&value).is_err());
}
