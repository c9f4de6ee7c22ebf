// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh`: thin operator CLI over the orchestration core — status, queue and
//! agent inspection via `lugh-wire`, plus a local test-adapter runner that
//! drives the orchestrator directly without a chat platform.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod commands;
mod env;
mod exit_error;
mod output;
#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};

use client::LughClient;
use commands::{agent, codebase, conversation, isolation, run, status, task};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "lugh", version, styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cross-cutting counts from the orchestrator's persisted state
    Status,
    /// Inspect conversations
    Conversation(conversation::ConversationArgs),
    /// Inspect registered codebases
    Codebase(codebase::CodebaseArgs),
    /// Inspect git-worktree isolation environments
    Isolation(isolation::IsolationArgs),
    /// Inspect the agent registry
    Agent(agent::AgentArgs),
    /// Inspect the pool's task queue
    Task(task::TaskArgs),
    /// Drive one message through a local orchestrator, no daemon required
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let output = cli.output;

    // `run` never talks to the orchestrator over the wire, so it doesn't need
    // a socket connection at all.
    if let Command::Run(args) = cli.command {
        if let Err(err) = run::handle(args).await {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
        return;
    }

    let socket_path = env::socket_path();
    let mut client = match LughClient::connect(&socket_path).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("could not reach the orchestrator at {}: {err}", socket_path.display());
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Status => status::handle(&mut client, output).await,
        Command::Conversation(args) => conversation::handle(args.command, &mut client, output).await,
        Command::Codebase(args) => codebase::handle(args.command, &mut client, output).await,
        Command::Isolation(args) => isolation::handle(args.command, &mut client, output).await,
        Command::Agent(args) => agent::handle(args.command, &mut client, output).await,
        Command::Task(args) => task::handle(args.command, &mut client, output).await,
        Command::Run(_) => unreachable!("handled above"),
    };

    if let Err(err) = result {
        match err.downcast::<ExitError>() {
            Ok(exit_err) => {
                eprintln!("{exit_err}");
                std::process::exit(exit_err.code);
            }
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }
}
