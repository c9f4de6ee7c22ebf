// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh agent` — inspect registered workers.

use clap::{Args, Subcommand};
use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, format_time_ago, handle_list, print_not_found, OutputFormat};

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List registered agents, optionally filtered by status ("idle"/"busy"/"offline")
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a single agent
    Show { agent_id: String },
}

pub async fn handle(command: AgentCommand, client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        AgentCommand::List { status } => {
            let response = client.query(Query::ListAgents { status }).await?;
            let agents = match response {
                Response::Agents(agents) => agents,
                other => anyhow::bail!("unexpected response to ListAgents: {other:?}"),
            };
            handle_list(format, &agents, "No agents", |rows| {
                for agent in rows {
                    println!(
                        "{}  {:<8}  task={:<14}  {}",
                        crate::color::header(&agent.agent_id.to_string()),
                        agent.status,
                        agent.current_task_id.as_deref().unwrap_or("-"),
                        crate::color::muted(&format!("heartbeat={}", format_time_ago(agent.last_heartbeat_ms)))
                    );
                }
            })
        }
        AgentCommand::Show { agent_id } => {
            let response = client.query(Query::GetAgent { agent_id: agent_id.clone() }).await?;
            match response {
                Response::Agent(agent) => format_or_json(format, &agent, || {
                    println!("{} {}", crate::color::header("agent_id:"), agent.agent_id);
                    println!("{} {}", crate::color::context("status:"), agent.status);
                    println!("{} {}", crate::color::context("capabilities:"), agent.capabilities.join(", "));
                    println!(
                        "{} {}",
                        crate::color::context("current_task:"),
                        agent.current_task_id.as_deref().unwrap_or("-")
                    );
                    println!("{} {}", crate::color::muted("heartbeat:"), format_time_ago(agent.last_heartbeat_ms));
                    println!("{} {}", crate::color::muted("registered:"), format_time_ago(agent.registered_at_ms));
                }),
                Response::NotFound => Err(print_not_found(format, "agent", &agent_id).into()),
                other => anyhow::bail!("unexpected response to GetAgent: {other:?}"),
            }
        }
    }
}
