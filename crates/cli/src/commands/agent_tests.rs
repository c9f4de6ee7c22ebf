// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use lugh_core::{Agent, AgentId};
use lugh_wire::{Query, Response};

use super::*;
use crate::test_support::client_expecting;

fn sample_agent() -> Agent {
    Agent::new(AgentId::new("worker-1"), vec!["rust".into(), "go".into()], 1_000)
}

#[tokio::test]
async fn list_filters_by_status_and_renders_rows() {
    let (mut client, server, _dir) = client_expecting(
        Query::ListAgents { status: Some("idle".into()) },
        Response::Agents(vec![sample_agent()]),
    )
    .await;

    handle(AgentCommand::List { status: Some("idle".into()) }, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_renders_a_found_agent() {
    let agent = sample_agent();
    let agent_id = agent.agent_id.as_str().to_string();
    let (mut client, server, _dir) =
        client_expecting(Query::GetAgent { agent_id: agent_id.clone() }, Response::Agent(agent)).await;

    handle(AgentCommand::Show { agent_id }, &mut client, OutputFormat::Text).await.unwrap();

    server.await.unwrap();
}

#[tokio::test]
async fn show_returns_not_found_as_an_exit_error() {
    let agent_id = "worker-missing".to_string();
    let (mut client, server, _dir) =
        client_expecting(Query::GetAgent { agent_id: agent_id.clone() }, Response::NotFound).await;

    let err = handle(AgentCommand::Show { agent_id }, &mut client, OutputFormat::Text).await.unwrap_err();
    let exit_err = err.downcast::<crate::exit_error::ExitError>().unwrap();
    assert_eq!(exit_err.code, 1);

    server.await.unwrap();
}
