// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_codebase_has_no_commands() {
    let codebase = Codebase::new("acme/widgets", "git@github.com:acme/widgets.git", "/repo", "claude-code", 1000);
    assert!(codebase.command("test").is_none());
}

#[test]
fn command_lookup_after_insert() {
    let mut codebase = Codebase::new("acme/widgets", "git@github.com:acme/widgets.git", "/repo", "claude-code", 1000);
    codebase.commands.insert("test".into(), "scripts/test.sh".into());
    assert_eq!(codebase.command("test"), Some("scripts/test.sh"));
    assert!(codebase.command("lint").is_none());
}

#[test]
fn owner_repo_splits_on_first_slash() {
    let codebase = Codebase::new("acme/widgets", "git@github.com:acme/widgets.git", "/repo", "claude-code", 1000);
    assert_eq!(codebase.owner_repo(), Some(("acme", "widgets")));
}

#[test]
fn owner_repo_is_none_without_a_slash() {
    let codebase = Codebase::new("widgets", "git@github.com:acme/widgets.git", "/repo", "claude-code", 1000);
    assert!(codebase.owner_repo().is_none());
}

#[test]
fn serde_round_trip() {
    let codebase = Codebase::new("acme/widgets", "git@github.com:acme/widgets.git", "/repo", "claude-code", 1000);
    let json = serde_json::to_string(&codebase).unwrap();
    let back: Codebase = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, codebase.id);
    assert_eq!(back.name, codebase.name);
}
