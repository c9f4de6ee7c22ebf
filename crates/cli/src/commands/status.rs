// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh status` — cross-cutting counts from `StatusSummary`.

use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, OutputFormat};

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

pub async fn handle(client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    let response = client.query(Query::StatusOverview).await?;
    let summary = match response {
        Response::Status(summary) => summary,
        other => anyhow::bail!("unexpected response to StatusOverview: {other:?}"),
    };

    format_or_json(format, &summary, || {
        println!("{} {}", crate::color::header("conversations:"), summary.conversations);
        println!("  {} {}", crate::color::muted("active sessions:"), summary.active_sessions);
        println!("{} {}", crate::color::header("codebases:"), summary.codebases);
        println!("  {} {}", crate::color::muted("active isolation envs:"), summary.active_isolation_envs);
        println!(
            "{} idle={} busy={}",
            crate::color::header("agents:"),
            summary.idle_agents,
            summary.busy_agents
        );
        println!("{} {}", crate::color::header("queued tasks:"), summary.queued_tasks);
    })
}
