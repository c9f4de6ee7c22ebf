// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use super::*;

fn git(cwd: &Path, args: &[&str]) {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
}

fn init_repo(dir: &Path) {
    git(dir, &["init"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "test"]);
    git(dir, &["commit", "--allow-empty", "-m", "init"]);
}

#[tokio::test]
async fn clones_a_local_repository_into_a_new_directory() {
    let remote = tempfile::tempdir().unwrap();
    init_repo(remote.path());

    let workspace = tempfile::tempdir().unwrap();
    let dest = workspace.path().join("alice").join("utils");
    tokio::fs::create_dir_all(dest.parent().unwrap()).await.unwrap();

    clone_repo(&remote.path().to_string_lossy(), &dest).await.unwrap();

    assert!(dest.join(".git").is_dir());
}

#[tokio::test]
async fn cloning_a_nonexistent_remote_fails() {
    let workspace = tempfile::tempdir().unwrap();
    let dest = workspace.path().join("nope");

    let result = clone_repo("/no/such/path/on/disk", &dest).await;
    assert!(result.is_err());
}
