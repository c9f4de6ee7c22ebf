// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn shutdown_serializes_as_unit_variant() {
    let json = serde_json::to_string(&Event::Shutdown).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert!(matches!(back, Event::Shutdown));
}

#[test]
fn agent_heartbeat_round_trips() {
    let event = Event::AgentHeartbeat { agent_id: "a1".into(), at_ms: 42 };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    match back {
        Event::AgentHeartbeat { agent_id, at_ms } => {
            assert_eq!(agent_id, "a1");
            assert_eq!(at_ms, 42);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}
