// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conversation::ConversationId;

#[test]
fn session_id_display() {
    let id = SessionId::new("test-session");
    assert_eq!(id.to_string(), "test-session");
}

#[test]
fn session_id_equality() {
    let id1 = SessionId::new("session-1");
    let id2 = SessionId::new("session-1");
    let id3 = SessionId::new("session-2");

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn session_id_from_str() {
    let id: SessionId = "test".into();
    assert_eq!(id.as_str(), "test");
}

#[test]
fn session_id_serde() {
    let id = SessionId::new("my-session");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-session\"");

    let parsed: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn new_session_is_active_with_no_external_id() {
    let session = Session::new(ConversationId::new(), "claude-code", 1000);
    assert!(session.active);
    assert!(session.external_session_id.is_none());
    assert!(session.last_command().is_none());
}

#[test]
fn set_last_command_round_trips_through_metadata() {
    let mut session = Session::new(ConversationId::new(), "claude-code", 1000);
    session.set_last_command("/compact");
    assert_eq!(session.last_command(), Some("/compact"));
}

#[test]
fn session_serde_round_trip() {
    let mut session = Session::new(ConversationId::new(), "codex", 42);
    session.external_session_id = Some(SessionId::new("resume-token-1"));
    let json = serde_json::to_string(&session).unwrap();
    let back: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, session.id);
    assert_eq!(back.external_session_id, session.external_session_id);
}
