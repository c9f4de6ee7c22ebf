// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn a_small_allowed_file_is_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    tokio::fs::write(&path, "hello").await.unwrap();
    assert!(is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn a_hidden_file_is_not_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env.md");
    tokio::fs::write(&path, "secret").await.unwrap();
    assert!(!is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn a_lock_file_is_not_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Cargo.lock");
    tokio::fs::write(&path, "lock").await.unwrap();
    assert!(!is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn a_file_under_a_blocked_build_directory_is_not_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("target").join("debug");
    tokio::fs::create_dir_all(&nested).await.unwrap();
    let path = nested.join("output.log");
    tokio::fs::write(&path, "log").await.unwrap();
    assert!(!is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn a_disallowed_extension_is_not_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    tokio::fs::write(&path, [0u8, 1, 2]).await.unwrap();
    assert!(!is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn a_missing_file_is_not_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    assert!(!is_auto_send_eligible(&path).await);
}

#[tokio::test]
async fn short_text_is_not_split() {
    let dir = tempfile::tempdir().unwrap();
    let result = split_long_response(dir.path(), "conv-1", "short").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn long_text_is_written_to_a_per_conversation_file() {
    let dir = tempfile::tempdir().unwrap();
    let text: String = "x".repeat(LONG_RESPONSE_THRESHOLD + 500);
    let result = split_long_response(dir.path(), "conv-1", &text).await.unwrap().unwrap();

    assert_eq!(result.preview.chars().count(), LONG_RESPONSE_THRESHOLD);
    let stored = tokio::fs::read_to_string(&result.full_text_path).await.unwrap();
    assert_eq!(stored, text);
    assert!(result.full_text_path.ends_with("conv-1.txt"));
}

#[test]
fn filtering_drops_tool_indicator_lines() {
    let text = "⚙ running tests...\nall tests passed\n🔧 cleaning up";
    assert_eq!(filter_tool_indicators(text), "all tests passed");
}

#[test]
fn filtering_falls_back_to_unfiltered_text_if_everything_would_be_dropped() {
    let text = "⚙ running tests...\n🔧 cleaning up";
    assert_eq!(filter_tool_indicators(text), text);
}
