// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh conversation` — inspect conversations known to the orchestrator.

use clap::{Args, Subcommand};
use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, format_time_ago, handle_list, print_not_found, OutputFormat};

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;

#[derive(Args)]
pub struct ConversationArgs {
    #[command(subcommand)]
    pub command: ConversationCommand,
}

#[derive(Subcommand)]
pub enum ConversationCommand {
    /// List conversations, optionally filtered by platform
    List {
        #[arg(long)]
        platform: Option<String>,
    },
    /// Show a single conversation
    Show { id: String },
}

pub async fn handle(command: ConversationCommand, client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        ConversationCommand::List { platform } => {
            let response = client.query(Query::ListConversations { platform }).await?;
            let conversations = match response {
                Response::Conversations(conversations) => conversations,
                other => anyhow::bail!("unexpected response to ListConversations: {other:?}"),
            };
            handle_list(format, &conversations, "No conversations", |rows| {
                for conv in rows {
                    println!(
                        "{}  {:<12}  {}  {}",
                        crate::color::header(&conv.id.to_string()),
                        conv.key.platform_type,
                        conv.key.platform_conversation_id,
                        crate::color::muted(&format!("last_activity={}", format_time_ago(conv.last_activity_at_ms)))
                    );
                }
            })
        }
        ConversationCommand::Show { id } => {
            let response = client.query(Query::GetConversation { id: id.clone() }).await?;
            match response {
                Response::Conversation(conv) => format_or_json(format, &conv, || {
                    println!("{} {}", crate::color::header("id:"), conv.id);
                    println!(
                        "{} {} / {}",
                        crate::color::context("platform:"),
                        conv.key.platform_type,
                        conv.key.platform_conversation_id
                    );
                    println!("{} {}", crate::color::context("assistant_kind:"), conv.assistant_kind);
                    println!(
                        "{} {}",
                        crate::color::context("codebase_id:"),
                        conv.codebase_id.as_ref().map(|c| c.as_str()).unwrap_or("-")
                    );
                    println!(
                        "{} {}",
                        crate::color::context("isolation_env:"),
                        conv.isolation_env_id.as_deref().unwrap_or("-")
                    );
                    println!(
                        "{} {}",
                        crate::color::muted("last_activity:"),
                        format_time_ago(conv.last_activity_at_ms)
                    );
                }),
                Response::NotFound => Err(print_not_found(format, "conversation", &id).into()),
                other => anyhow::bail!("unexpected response to GetConversation: {other:?}"),
            }
        }
    }
}
