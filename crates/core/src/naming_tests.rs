// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

#[test]
fn slug_lowercases_and_collapses_punctuation() {
    assert_eq!(slug("Fix Bug #42!!"), "fix-bug-42");
}

#[test]
fn slug_trims_leading_and_trailing_dashes() {
    assert_eq!(slug("--hello--"), "hello");
}

#[test]
fn slug_truncates_to_fifty_chars() {
    let input = "a".repeat(80);
    assert_eq!(slug(&input).len(), 50);
}

#[test]
fn short_hash_is_eight_hex_chars_and_stable() {
    let a = short_hash("thread-123");
    let b = short_hash("thread-123");
    assert_eq!(a.len(), 8);
    assert_eq!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn branch_name_per_workflow_type() {
    assert_eq!(branch_name(WorkflowType::Issue, "42"), "issue-42");
    assert_eq!(branch_name(WorkflowType::Pr, "7"), "pr-7-review");
    assert_eq!(branch_name(WorkflowType::Review, "7"), "review-7");
    assert_eq!(branch_name(WorkflowType::Task, "Batch #1"), "task-batch-1");
    assert!(branch_name(WorkflowType::Thread, "abc").starts_with("thread-"));
}

#[test]
fn worktree_path_duplicates_owner_repo_under_worktrees() {
    let root = Path::new("/workspace");
    let path = worktree_path(root, "acme", "widgets", "issue-42").unwrap();
    assert_eq!(path, Path::new("/workspace/acme/widgets/worktrees/acme/widgets/issue-42"));
}

#[test]
fn worktree_path_rejects_traversal_in_any_segment() {
    let root = Path::new("/workspace");
    assert!(worktree_path(root, "../etc", "widgets", "issue-1").is_none());
    assert!(worktree_path(root, "acme", "widgets", "../../../etc/passwd").is_none());
}

#[test]
fn is_within_accepts_nested_paths_and_rejects_escapes() {
    let root = Path::new("/workspace");
    assert!(is_within(root, Path::new("/workspace/a/b")));
    assert!(!is_within(root, Path::new("/workspace/../etc")));
}
