// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use lugh_core::Codebase;
use lugh_wire::{Query, Response};

use super::*;
use crate::test_support::client_expecting;

fn sample_codebase() -> Codebase {
    let mut codebase = Codebase::new("acme/widgets", "git@github.com:acme/widgets.git", ".", "claude", 1_000);
    codebase.commands.insert("test".into(), "./scripts/test.sh".into());
    codebase
}

#[tokio::test]
async fn list_renders_registered_codebases() {
    let (mut client, server, _dir) =
        client_expecting(Query::ListCodebases, Response::Codebases(vec![sample_codebase()])).await;

    handle(CodebaseCommand::List, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_renders_a_found_codebase_with_its_commands() {
    let codebase = sample_codebase();
    let id = codebase.id.to_string();
    let (mut client, server, _dir) =
        client_expecting(Query::GetCodebase { id: id.clone() }, Response::Codebase(codebase)).await;

    handle(CodebaseCommand::Show { id }, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_returns_not_found_as_an_exit_error() {
    let id = "code_missing".to_string();
    let (mut client, server, _dir) = client_expecting(Query::GetCodebase { id: id.clone() }, Response::NotFound).await;

    let err = handle(CodebaseCommand::Show { id }, &mut client, OutputFormat::Json).await.unwrap_err();
    let exit_err = err.downcast::<crate::exit_error::ExitError>().unwrap();
    assert_eq!(exit_err.code, 1);

    server.await.unwrap();
}
