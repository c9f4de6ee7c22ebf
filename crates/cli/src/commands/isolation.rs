// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh isolation` — inspect git-worktree sandboxes.

use clap::{Args, Subcommand};
use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, handle_list, print_not_found, OutputFormat};

#[cfg(test)]
#[path = "isolation_tests.rs"]
mod tests;

#[derive(Args)]
pub struct IsolationArgs {
    #[command(subcommand)]
    pub command: IsolationCommand,
}

#[derive(Subcommand)]
pub enum IsolationCommand {
    /// List isolation environments
    List {
        #[arg(long)]
        codebase_id: Option<String>,
        #[arg(long)]
        active_only: bool,
    },
    /// Show a single isolation environment
    Show { id: String },
}

pub async fn handle(command: IsolationCommand, client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        IsolationCommand::List { codebase_id, active_only } => {
            let response = client.query(Query::ListIsolationEnvs { codebase_id, active_only }).await?;
            let envs = match response {
                Response::IsolationEnvs(envs) => envs,
                other => anyhow::bail!("unexpected response to ListIsolationEnvs: {other:?}"),
            };
            handle_list(format, &envs, "No isolation environments", |rows| {
                for env in rows {
                    println!(
                        "{}  {:<8}  {}  {}",
                        crate::color::header(&env.id.to_string()),
                        env.status,
                        env.branch,
                        crate::color::muted(&env.path)
                    );
                }
            })
        }
        IsolationCommand::Show { id } => {
            let response = client.query(Query::GetIsolationEnv { id: id.clone() }).await?;
            match response {
                Response::IsolationEnv(env) => format_or_json(format, &env, || {
                    println!("{} {}", crate::color::header("id:"), env.id);
                    println!("{} {}", crate::color::context("codebase:"), env.key.codebase_id.as_str());
                    println!("{} {} {}", crate::color::context("workflow:"), env.key.workflow_type, env.key.workflow_id);
                    println!("{} {}", crate::color::context("status:"), env.status);
                    println!("{} {}", crate::color::context("provider:"), env.provider);
                    println!("{} {}", crate::color::context("branch:"), env.branch);
                    println!("{} {}", crate::color::muted("path:"), env.path);
                }),
                Response::NotFound => Err(print_not_found(format, "isolation env", &id).into()),
                other => anyhow::bail!("unexpected response to GetIsolationEnv: {other:?}"),
            }
        }
    }
}
