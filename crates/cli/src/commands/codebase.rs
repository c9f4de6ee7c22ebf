// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh codebase` — inspect registered git remotes.

use clap::{Args, Subcommand};
use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, handle_list, print_not_found, OutputFormat};

#[cfg(test)]
#[path = "codebase_tests.rs"]
mod tests;

#[derive(Args)]
pub struct CodebaseArgs {
    #[command(subcommand)]
    pub command: CodebaseCommand,
}

#[derive(Subcommand)]
pub enum CodebaseCommand {
    /// List registered codebases
    List,
    /// Show a single codebase
    Show { id: String },
}

pub async fn handle(command: CodebaseCommand, client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        CodebaseCommand::List => {
            let response = client.query(Query::ListCodebases).await?;
            let codebases = match response {
                Response::Codebases(codebases) => codebases,
                other => anyhow::bail!("unexpected response to ListCodebases: {other:?}"),
            };
            handle_list(format, &codebases, "No codebases", |rows| {
                for codebase in rows {
                    println!(
                        "{}  {:<30}  {}",
                        crate::color::header(&codebase.id.to_string()),
                        codebase.name,
                        crate::color::muted(&codebase.remote_url)
                    );
                }
            })
        }
        CodebaseCommand::Show { id } => {
            let response = client.query(Query::GetCodebase { id: id.clone() }).await?;
            match response {
                Response::Codebase(codebase) => format_or_json(format, &codebase, || {
                    println!("{} {}", crate::color::header("id:"), codebase.id);
                    println!("{} {}", crate::color::header("name:"), codebase.name);
                    println!("{} {}", crate::color::context("remote_url:"), codebase.remote_url);
                    println!("{} {}", crate::color::context("default_cwd:"), codebase.default_cwd);
                    println!("{} {}", crate::color::context("assistant_kind:"), crate::color::literal(&codebase.assistant_kind));
                    if codebase.commands.is_empty() {
                        println!("{} -", crate::color::muted("commands:"));
                    } else {
                        println!("{}", crate::color::muted("commands:"));
                        let mut names: Vec<_> = codebase.commands.keys().collect();
                        names.sort();
                        for name in names {
                            println!("  {} -> {}", crate::color::literal(name), codebase.commands[name]);
                        }
                    }
                }),
                Response::NotFound => Err(print_not_found(format, "codebase", &id).into()),
                other => anyhow::bail!("unexpected response to GetCodebase: {other:?}"),
            }
        }
    }
}
