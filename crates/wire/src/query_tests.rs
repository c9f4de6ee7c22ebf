// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tagged_json_shape() {
    let query = Query::GetAgent { agent_id: "a1".into() };
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["type"], "GetAgent");
    assert_eq!(json["agent_id"], "a1");
}

#[test]
fn unit_variant_round_trips() {
    let query = Query::StatusOverview;
    let json = serde_json::to_string(&query).unwrap();
    let back: Query = serde_json::from_str(&json).unwrap();
    assert_eq!(back, query);
}

#[test]
fn optional_filter_defaults_when_absent() {
    let json = r#"{"type":"ListConversations"}"#;
    let query: Query = serde_json::from_str(json).unwrap();
    assert_eq!(query, Query::ListConversations { platform: None });
}
