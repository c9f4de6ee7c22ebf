// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lugh task` — inspect the pool's priority task queue.

use clap::{Args, Subcommand};
use lugh_wire::{Query, Response};

use crate::client::LughClient;
use crate::output::{format_or_json, handle_list, print_not_found, OutputFormat};

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List queued tasks, highest priority first
    List,
    /// Show a single task
    Show { id: String },
}

pub async fn handle(command: TaskCommand, client: &mut LughClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        TaskCommand::List => {
            let response = client.query(Query::ListQueuedTasks).await?;
            let tasks = match response {
                Response::Tasks(tasks) => tasks,
                other => anyhow::bail!("unexpected response to ListQueuedTasks: {other:?}"),
            };
            handle_list(format, &tasks, "No queued tasks", |rows| {
                for task in rows {
                    println!(
                        "{}  prio={:<2}  {:<9}  {}",
                        crate::color::header(&task.id.to_string()),
                        task.priority,
                        task.status,
                        crate::color::muted(&task.task_type)
                    );
                }
            })
        }
        TaskCommand::Show { id } => {
            let response = client.query(Query::GetTask { id: id.clone() }).await?;
            match response {
                Response::Task(task) => format_or_json(format, &task, || {
                    println!("{} {}", crate::color::header("id:"), task.id);
                    println!("{} {}", crate::color::context("conversation:"), task.conversation_id);
                    println!("{} {}", crate::color::context("task_type:"), task.task_type);
                    println!("{} {}", crate::color::context("priority:"), task.priority);
                    println!("{} {}", crate::color::context("status:"), task.status);
                    println!(
                        "{} {}",
                        crate::color::muted("assigned_agent:"),
                        task.assigned_agent_id.as_ref().map(|a| a.as_str()).unwrap_or("-")
                    );
                    if let Some(error) = &task.error {
                        println!("{} {error}", crate::color::header("error:"));
                    }
                }),
                Response::NotFound => Err(print_not_found(format, "task", &id).into()),
                other => anyhow::bail!("unexpected response to GetTask: {other:?}"),
            }
        }
    }
}
