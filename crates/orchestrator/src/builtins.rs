// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in slash command handlers (spec §4.8 step 2, §6.3). Each handler
//! has joint access to the store, isolation manager, and pool coordinator,
//! so these live as `Orchestrator` methods rather than free functions.

use std::collections::HashMap;

use lugh_adapters::{AssistantSession, ChatAdapter, NotifyAdapter};
use lugh_core::{Clock, Codebase, Conversation, Template};
use lugh_storage::Event;
use tracing::warn;

use crate::command::BUILTIN_COMMANDS;
use crate::error::{classify_external, ExternalError, OrchestratorError};
use crate::git::clone_repo;
use crate::Orchestrator;

/// Result of a built-in command (spec §6.3: `(success, message, modified?,
/// follow_up_prompt?, swarm_request?)`).
#[derive(Debug, Default)]
pub struct BuiltinOutcome {
    pub success: bool,
    pub message: String,
    pub modified: bool,
    pub follow_up_prompt: Option<String>,
    pub swarm_request: Option<String>,
}

impl BuiltinOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), ..Default::default() }
    }

    fn ok_modified(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), modified: true, ..Default::default() }
    }

    fn err(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), ..Default::default() }
    }
}

/// Command-file extensions scanned for by `/clone`'s auto-load and
/// `/load-commands` (directory contents -> `name -> relative path`).
const COMMAND_DIRS: &[&str] = &[".claude/commands", ".agents/commands"];

/// Prompt driven through `/stop`'s `follow_up_prompt` (spec §4.8 step 2):
/// asks the assistant for a short wrap-up instead of leaving the run
/// cancelled mid-thought with no acknowledgement of its own.
const STOP_FOLLOW_UP_PROMPT: &str =
    "The user asked you to stop. Acknowledge that you stopped and briefly summarize what was completed so far. Do not start any new work.";

impl<A, S, N, C> Orchestrator<A, S, N, C>
where
    A: ChatAdapter,
    S: AssistantSession,
    N: NotifyAdapter,
    C: Clock,
{
    pub(crate) async fn run_builtin(
        &self,
        conversation: &Conversation,
        name: &str,
        args: &[String],
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        match name {
            "help" => Ok(BuiltinOutcome::ok(format!("Available commands: {}", BUILTIN_COMMANDS.join(", ")))),
            "quickref" => Ok(BuiltinOutcome::ok(
                "/clone <url>, /repo <name>, /setcwd <path>, /command-invoke <name> [args], /stop",
            )),
            "status" => self.builtin_status(conversation).await,
            "getcwd" => self.builtin_getcwd(conversation).await,
            "setcwd" => self.builtin_setcwd(conversation, args, now_ms).await,
            "clone" => self.builtin_clone(conversation, args, now_ms).await,
            "repos" => self.builtin_repos().await,
            "repo" => self.builtin_repo(conversation, args, now_ms).await,
            "repo-remove" => self.builtin_repo_remove(conversation, now_ms).await,
            "reset" => self.builtin_reset(conversation, now_ms).await,
            "reset-context" => self.builtin_reset_context(conversation, now_ms).await,
            "command-set" => self.builtin_command_set(conversation, args, now_ms).await,
            "load-commands" => self.builtin_load_commands(conversation, now_ms).await,
            "commands" | "commands-all" => self.builtin_commands(conversation).await,
            "template-add" => self.builtin_template_add(args, now_ms).await,
            "template-list" | "templates" | "prompts" | "chains" => self.builtin_template_list().await,
            "template-delete" => self.builtin_template_delete(args, now_ms).await,
            "worktree" => self.builtin_worktree(conversation, args, now_ms).await,
            "init" => self.builtin_clone(conversation, args, now_ms).await,
            "verbose" => self.builtin_verbose(conversation, now_ms).await,
            "stop" => self.builtin_stop(conversation).await,
            "agents" => self.builtin_agents().await,
            other => Ok(BuiltinOutcome::err(format!("unimplemented built-in: {other}"))),
        }
    }

    async fn builtin_status(&self, conversation: &Conversation) -> Result<BuiltinOutcome, OrchestratorError> {
        let store = self.store.lock().await;
        let codebase_name = conversation
            .codebase_id
            .as_ref()
            .and_then(|id| store.state().codebases.get(&id.to_string()))
            .map(|c| c.name.as_str())
            .unwrap_or("(none)");
        let session = store.state().active_session_for(conversation.id.as_str());
        let message = format!(
            "codebase: {codebase_name}\nisolation: {}\nsession active: {}",
            conversation.isolation_env_id.as_deref().unwrap_or("(none)"),
            session.is_some()
        );
        Ok(BuiltinOutcome::ok(message))
    }

    async fn builtin_getcwd(&self, conversation: &Conversation) -> Result<BuiltinOutcome, OrchestratorError> {
        if let Some(value) = conversation.metadata.get("cwd_override").and_then(|v| v.as_str()) {
            return Ok(BuiltinOutcome::ok(value.to_string()));
        }
        let store = self.store.lock().await;
        let cwd = conversation
            .codebase_id
            .as_ref()
            .and_then(|id| store.state().codebases.get(&id.to_string()))
            .map(|c| c.default_cwd.clone())
            .unwrap_or_else(|| self.workspace_base.to_string_lossy().into_owned());
        Ok(BuiltinOutcome::ok(cwd))
    }

    async fn builtin_setcwd(
        &self,
        conversation: &Conversation,
        args: &[String],
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(path) = args.first() else {
            return Ok(BuiltinOutcome::err("usage: /setcwd <path>"));
        };
        let candidate = std::path::Path::new(path);
        if !lugh_core::is_within(&self.workspace_base, candidate) {
            return Ok(BuiltinOutcome::err("path is outside the configured workspace"));
        }
        let mut store = self.store.lock().await;
        store
            .apply(Event::ConversationMetadataSet {
                conversation_id: conversation.id.to_string(),
                key: "cwd_override".to_string(),
                value: serde_json::Value::String(path.clone()),
            })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        let _ = now_ms;
        Ok(BuiltinOutcome::ok_modified(format!("cwd set to {path}")))
    }

    async fn builtin_clone(
        &self,
        conversation: &Conversation,
        args: &[String],
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(remote_url) = args.first() else {
            return Ok(BuiltinOutcome::err("usage: /clone <url>"));
        };
        let name = repo_name_from_url(remote_url)
            .ok_or_else(|| OrchestratorError::UserInput("could not derive owner/repo from url".to_string()))?;

        let mut store = self.store.lock().await;
        if let Some(existing) = store.state().find_codebase_by_name(&name).cloned() {
            self.bind_codebase(&mut store, conversation, &existing, now_ms)?;
            return Ok(BuiltinOutcome::ok_modified(format!("already cloned as {name}; conversation linked")));
        }
        drop(store);

        let (owner, repo) = name.split_once('/').expect("repo_name_from_url always returns owner/repo");
        let dest = self.workspace_base.join(owner).join(repo);
        tokio::fs::create_dir_all(dest.parent().unwrap_or(&self.workspace_base))
            .await
            .map_err(|e| classify_external(ExternalError::Store(lugh_storage::StoreError::Io(e))))?;
        clone_repo(remote_url, &dest).await.map_err(|e| OrchestratorError::UserInput(e.to_string()))?;

        let mut codebase =
            Codebase::new(name.as_str(), remote_url.clone(), dest.to_string_lossy(), conversation.assistant_kind.as_str(), now_ms);
        codebase.commands = discover_commands(&dest).await;

        let mut store = self.store.lock().await;
        store
            .apply(Event::CodebaseRegistered { codebase: codebase.clone() })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        self.bind_codebase(&mut store, conversation, &codebase, now_ms)?;
        Ok(BuiltinOutcome::ok_modified(format!("cloned {name} into {}", dest.display())))
    }

    async fn builtin_repos(&self) -> Result<BuiltinOutcome, OrchestratorError> {
        let store = self.store.lock().await;
        let mut names: Vec<&str> = store.state().codebases.values().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if names.is_empty() {
            return Ok(BuiltinOutcome::ok("no codebases registered"));
        }
        Ok(BuiltinOutcome::ok(names.join("\n")))
    }

    async fn builtin_repo(
        &self,
        conversation: &Conversation,
        args: &[String],
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(name) = args.first() else {
            return Ok(BuiltinOutcome::err("usage: /repo <owner/repo>"));
        };
        let mut store = self.store.lock().await;
        let Some(codebase) = store.state().find_codebase_by_name(name).cloned() else {
            return Ok(BuiltinOutcome::err(format!("codebase {name} not found")));
        };
        self.bind_codebase(&mut store, conversation, &codebase, now_ms)?;
        Ok(BuiltinOutcome::ok_modified(format!("conversation linked to {name}")))
    }

    async fn builtin_repo_remove(
        &self,
        conversation: &Conversation,
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let mut store = self.store.lock().await;
        store
            .apply(Event::ConversationCodebaseSet { conversation_id: conversation.id.to_string(), codebase_id: None })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        store
            .apply(Event::ConversationIsolationSet { conversation_id: conversation.id.to_string(), isolation_env_id: None })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        if let Some(active) = store.state().active_session_for(conversation.id.as_str()) {
            store
                .apply(Event::SessionDeactivated { session_id: active.id.to_string(), at_ms: now_ms })
                .map_err(|e| classify_external(ExternalError::Store(e)))?;
        }
        Ok(BuiltinOutcome::ok_modified("conversation unlinked from its codebase"))
    }

    async fn builtin_reset(&self, conversation: &Conversation, now_ms: u64) -> Result<BuiltinOutcome, OrchestratorError> {
        let mut store = self.store.lock().await;
        if let Some(active) = store.state().active_session_for(conversation.id.as_str()) {
            store
                .apply(Event::SessionDeactivated { session_id: active.id.to_string(), at_ms: now_ms })
                .map_err(|e| classify_external(ExternalError::Store(e)))?;
        }
        Ok(BuiltinOutcome::ok_modified("session reset; next message starts fresh"))
    }

    async fn builtin_reset_context(
        &self,
        conversation: &Conversation,
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        self.builtin_reset(conversation, now_ms).await?;
        self.builtin_repo_remove(conversation, now_ms).await?;
        Ok(BuiltinOutcome::ok_modified("session and codebase binding both reset"))
    }

    async fn builtin_command_set(
        &self,
        conversation: &Conversation,
        args: &[String],
        _now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let (Some(name), Some(path)) = (args.first(), args.get(1)) else {
            return Ok(BuiltinOutcome::err("usage: /command-set <name> <path>"));
        };
        let Some(codebase_id) = &conversation.codebase_id else {
            return Ok(BuiltinOutcome::err("no codebase set for this conversation"));
        };
        let mut store = self.store.lock().await;
        let Some(codebase) = store.state().codebases.get(&codebase_id.to_string()).cloned() else {
            return Ok(BuiltinOutcome::err("codebase not found"));
        };
        let mut commands = codebase.commands.clone();
        commands.insert(name.clone(), path.clone());
        store
            .apply(Event::CodebaseCommandsSet { codebase_id: codebase_id.to_string(), commands })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(BuiltinOutcome::ok_modified(format!("command '{name}' set to {path}")))
    }

    async fn builtin_load_commands(
        &self,
        conversation: &Conversation,
        _now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(codebase_id) = &conversation.codebase_id else {
            return Ok(BuiltinOutcome::err("no codebase set for this conversation"));
        };
        let mut store = self.store.lock().await;
        let Some(codebase) = store.state().codebases.get(&codebase_id.to_string()).cloned() else {
            return Ok(BuiltinOutcome::err("codebase not found"));
        };
        let commands = discover_commands(std::path::Path::new(&codebase.default_cwd)).await;
        let count = commands.len();
        store
            .apply(Event::CodebaseCommandsSet { codebase_id: codebase_id.to_string(), commands })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(BuiltinOutcome::ok_modified(format!("loaded {count} commands")))
    }

    async fn builtin_commands(&self, conversation: &Conversation) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(codebase_id) = &conversation.codebase_id else {
            return Ok(BuiltinOutcome::ok("no codebase set for this conversation"));
        };
        let store = self.store.lock().await;
        let Some(codebase) = store.state().codebases.get(&codebase_id.to_string()) else {
            return Ok(BuiltinOutcome::ok("codebase not found"));
        };
        if codebase.commands.is_empty() {
            return Ok(BuiltinOutcome::ok("no codebase commands registered"));
        }
        let mut names: Vec<&str> = codebase.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        Ok(BuiltinOutcome::ok(names.join("\n")))
    }

    async fn builtin_template_add(&self, args: &[String], now_ms: u64) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(name) = args.first() else {
            return Ok(BuiltinOutcome::err("usage: /template-add <name> <body...>"));
        };
        if args.len() < 2 {
            return Ok(BuiltinOutcome::err("usage: /template-add <name> <body...>"));
        }
        let body = args[1..].join(" ");
        let template = Template::new(name.clone(), body, now_ms);
        let mut store = self.store.lock().await;
        store.apply(Event::TemplateUpserted { template }).map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(BuiltinOutcome::ok_modified(format!("template '{name}' saved")))
    }

    async fn builtin_template_list(&self) -> Result<BuiltinOutcome, OrchestratorError> {
        let store = self.store.lock().await;
        let mut names: Vec<&str> = store.state().templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        if names.is_empty() {
            return Ok(BuiltinOutcome::ok("no templates registered"));
        }
        Ok(BuiltinOutcome::ok(names.join("\n")))
    }

    async fn builtin_template_delete(&self, args: &[String], _now_ms: u64) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(name) = args.first() else {
            return Ok(BuiltinOutcome::err("usage: /template-delete <name>"));
        };
        let mut store = self.store.lock().await;
        if !store.state().templates.contains_key(name) {
            return Ok(BuiltinOutcome::err(format!("template {name} not found")));
        }
        store
            .apply(Event::TemplateDeleted { name: name.clone() })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(BuiltinOutcome::ok_modified(format!("template '{name}' deleted")))
    }

    async fn builtin_worktree(
        &self,
        conversation: &Conversation,
        args: &[String],
        now_ms: u64,
    ) -> Result<BuiltinOutcome, OrchestratorError> {
        let Some(codebase_id) = &conversation.codebase_id else {
            return Ok(BuiltinOutcome::err("no codebase set for this conversation"));
        };
        let sub = args.first().map(String::as_str).unwrap_or("list");
        match sub {
            "list" => {
                let store = self.store.lock().await;
                let envs: Vec<String> =
                    store.state().active_envs_for_codebase(codebase_id.as_str()).map(|e| e.branch.clone()).collect();
                if envs.is_empty() {
                    return Ok(BuiltinOutcome::ok("no active worktrees"));
                }
                Ok(BuiltinOutcome::ok(envs.join("\n")))
            }
            "remove" => {
                let Some(env_id) = args.get(1) else {
                    return Ok(BuiltinOutcome::err("usage: /worktree remove <env_id>"));
                };
                self.isolation
                    .destroy(&env_id.as_str().into(), false, now_ms)
                    .await
                    .map_err(|e| classify_external(ExternalError::Isolation(e)))?;
                Ok(BuiltinOutcome::ok_modified(format!("worktree {env_id} removed")))
            }
            "cleanup" => {
                let (repo_path, default_branch) = self.codebase_repo_path(codebase_id).await?;
                let stale = args.get(1).map(String::as_str) == Some("stale");
                let report = if stale {
                    self.isolation
                        .cleanup_stale(codebase_id, &repo_path, &default_branch, crate::env::stale_threshold_days(), now_ms)
                        .await
                } else {
                    self.isolation.cleanup_merged(codebase_id, &repo_path, &default_branch, now_ms).await
                }
                .map_err(|e| classify_external(ExternalError::Isolation(e)))?;
                Ok(BuiltinOutcome::ok_modified(format!("removed {} worktree(s)", report.removed.len())))
            }
            "orphans" => Ok(BuiltinOutcome::ok("orphan detection is not implemented in this reimplementation")),
            "create" => Ok(BuiltinOutcome::ok(
                "a worktree is created automatically on the next message; nothing to do here",
            )),
            other => Ok(BuiltinOutcome::err(format!("unknown worktree subcommand: {other}"))),
        }
    }

    async fn builtin_verbose(&self, conversation: &Conversation, _now_ms: u64) -> Result<BuiltinOutcome, OrchestratorError> {
        let current = conversation.metadata.get("verbose").and_then(|v| v.as_bool()).unwrap_or(false);
        let mut store = self.store.lock().await;
        store
            .apply(Event::ConversationMetadataSet {
                conversation_id: conversation.id.to_string(),
                key: "verbose".to_string(),
                value: serde_json::Value::Bool(!current),
            })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(BuiltinOutcome::ok_modified(format!("verbose mode is now {}", !current)))
    }

    async fn builtin_stop(&self, conversation: &Conversation) -> Result<BuiltinOutcome, OrchestratorError> {
        let stopped = self.aborts.stop(&conversation.id).await;
        if stopped {
            // The cancelled run never got to send its own wrap-up, so drive
            // one more turn whose prompt asks the assistant to acknowledge
            // the stop instead of leaving the user with just our ack line
            // (spec §4.8 step 2: `/stop` may return a `follow_up_prompt`
            // that becomes the next AI prompt instead of returning).
            Ok(BuiltinOutcome {
                success: true,
                message: "stopping the current response".to_string(),
                modified: false,
                follow_up_prompt: Some(STOP_FOLLOW_UP_PROMPT.to_string()),
                swarm_request: None,
            })
        } else {
            Ok(BuiltinOutcome::ok("nothing to stop"))
        }
    }

    async fn builtin_agents(&self) -> Result<BuiltinOutcome, OrchestratorError> {
        let status = self.pool.status().await;
        Ok(BuiltinOutcome::ok(format!(
            "idle: {}, busy: {}, offline: {}",
            status.agents.idle, status.agents.busy, status.agents.offline
        )))
    }

    /// Link `conversation` to `codebase`, deactivating any active session if
    /// this is actually a change (spec Scenario 1: re-linking to the same
    /// codebase is a no-op for session state).
    fn bind_codebase(
        &self,
        store: &mut tokio::sync::MutexGuard<'_, lugh_storage::Store>,
        conversation: &Conversation,
        codebase: &Codebase,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        let changed = conversation.codebase_id.as_ref() != Some(&codebase.id);
        store
            .apply(Event::ConversationCodebaseSet {
                conversation_id: conversation.id.to_string(),
                codebase_id: Some(codebase.id.to_string()),
            })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        if changed {
            store
                .apply(Event::ConversationIsolationSet { conversation_id: conversation.id.to_string(), isolation_env_id: None })
                .map_err(|e| classify_external(ExternalError::Store(e)))?;
            if let Some(active) = store.state().active_session_for(conversation.id.as_str()) {
                store
                    .apply(Event::SessionDeactivated { session_id: active.id.to_string(), at_ms: now_ms })
                    .map_err(|e| classify_external(ExternalError::Store(e)))?;
            }
        }
        Ok(())
    }

    async fn codebase_repo_path(
        &self,
        codebase_id: &lugh_core::CodebaseId,
    ) -> Result<(std::path::PathBuf, String), OrchestratorError> {
        let store = self.store.lock().await;
        let codebase = store
            .state()
            .codebases
            .get(&codebase_id.to_string())
            .ok_or_else(|| OrchestratorError::NotFound(format!("codebase {codebase_id} not found")))?;
        Ok((std::path::PathBuf::from(&codebase.default_cwd), self.default_branch.clone()))
    }
}

/// Derive `owner/repo` from a remote URL, accepting both
/// `https://host/owner/repo(.git)` and `git@host:owner/repo(.git)` forms.
fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches(".git").trim_end_matches('/');
    let path = if let Some(idx) = trimmed.find("://") {
        &trimmed[idx + 3..]
    } else if let Some(idx) = trimmed.find(':') {
        &trimmed[idx + 1..]
    } else {
        trimmed
    };
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let repo = segments.pop()?;
    let owner = segments.pop()?;
    Some(format!("{owner}/{repo}"))
}

/// Scan `.claude/commands` then `.agents/commands` under `root` for files,
/// registering each file's stem as a command name mapped to its path
/// relative to `root` (spec Scenario 1 "commands auto-loaded").
async fn discover_commands(root: &std::path::Path) -> HashMap<String, String> {
    let mut commands = HashMap::new();
    for dir in COMMAND_DIRS {
        let full = root.join(dir);
        let Ok(mut entries) = tokio::fs::read_dir(&full).await else { continue };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let Ok(relative) = path.strip_prefix(root) else { continue };
            commands.insert(stem.to_string(), relative.to_string_lossy().into_owned());
        }
        if !commands.is_empty() {
            break;
        }
    }
    if commands.is_empty() {
        warn!(?root, "no command directory found during auto-load");
    }
    commands
}

#[cfg(test)]
#[path = "builtins_tests.rs"]
mod tests;
