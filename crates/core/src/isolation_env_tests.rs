// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::codebase::CodebaseId;

fn key() -> IsolationKey {
    IsolationKey::new(CodebaseId::new(), WorkflowType::Pr, "42")
}

#[test]
fn workflow_type_display() {
    assert_eq!(WorkflowType::Issue.to_string(), "issue");
    assert_eq!(WorkflowType::Pr.to_string(), "pr");
    assert_eq!(WorkflowType::Review.to_string(), "review");
    assert_eq!(WorkflowType::Thread.to_string(), "thread");
    assert_eq!(WorkflowType::Task.to_string(), "task");
}

#[test]
fn new_env_is_active() {
    let env = IsolationEnv::new(key(), "git_worktree", "/work/isol123", "lugh/pr-42", "github", 1000);
    assert!(env.is_active());
    assert!(env.destroyed_at_ms.is_none());
}

#[test]
fn destroy_sets_status_and_timestamp() {
    let mut env = IsolationEnv::new(key(), "git_worktree", "/work/isol123", "lugh/pr-42", "github", 1000);
    env.destroy(5000);
    assert!(!env.is_active());
    assert_eq!(env.destroyed_at_ms, Some(5000));
}

#[test]
fn keys_with_same_fields_are_equal() {
    let codebase_id = CodebaseId::new();
    let a = IsolationKey::new(codebase_id, WorkflowType::Issue, "7");
    let b = IsolationKey::new(codebase_id, WorkflowType::Issue, "7");
    assert_eq!(a, b);
}

#[test]
fn serde_round_trip() {
    let env = IsolationEnv::new(key(), "git_worktree", "/work/isol123", "lugh/pr-42", "github", 1000);
    let json = serde_json::to_string(&env).unwrap();
    let back: IsolationEnv = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, env.id);
    assert_eq!(back.status, env.status);
}
