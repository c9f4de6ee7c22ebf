// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lugh-orchestrator: the Conversation Orchestrator (spec §4.8 C8).
//!
//! Turns one incoming platform message into zero or more outbound adapter
//! calls, threading every other component crate together: command
//! classification, isolation resolution (`lugh-isolation`), session
//! lifecycle, swarm dispatch (`lugh-pool`), the AI session stream, and
//! response post-processing.

pub mod abort;
pub mod builtins;
pub mod command;
pub mod env;
pub mod error;
pub mod git;
pub mod postprocess;
pub mod risk;

use std::path::PathBuf;
use std::sync::Arc;

use lugh_adapters::{AssistantEvent, AssistantSession, ChatAdapter, NotifyAdapter, StreamingMode};
use lugh_core::{
    Clock, Conversation, ConversationId, ConversationKey, IsolationEnvId, RiskLevel, Session, SystemClock,
    WorkflowType,
};
use lugh_isolation::{IsolationManager, ResolveHints, ResolveRequest};
use lugh_pool::PoolCoordinator;
use lugh_storage::{Event, Store};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::abort::AbortRegistry;
use crate::command::{classify, render_codebase_command, render_router, CommandClass};
use crate::error::{classify_external, user_safe_message, ExternalError, OrchestratorError};
use crate::postprocess::{filter_tool_indicators, is_auto_send_eligible, split_long_response};
use crate::risk::classify_tool_risk;

/// Identity and routing context for one incoming platform message (spec
/// §4.8 step 1).
pub struct IncomingMessage {
    pub key: ConversationKey,
    pub assistant_kind: String,
    pub parent_conversation_id: Option<ConversationId>,
    pub text: String,
    /// Prepended under a marker before the user's prompt (spec §4.8 step 4).
    pub thread_context: Option<String>,
    /// The unit of work behind isolation resolution (glossary "Workflow").
    /// `None` defaults to this conversation itself as a `Thread` workflow —
    /// every platform message belongs to *some* thread, so this is always
    /// well-defined even without an explicit issue/PR identity.
    pub workflow: Option<(WorkflowType, String)>,
    pub hints: ResolveHints,
}

impl IncomingMessage {
    pub fn new(key: ConversationKey, assistant_kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key,
            assistant_kind: assistant_kind.into(),
            parent_conversation_id: None,
            text: text.into(),
            thread_context: None,
            workflow: None,
            hints: ResolveHints::default(),
        }
    }
}

/// `A`: the chat platform. `S`: the AI assistant session backend. `N`: the
/// desktop/system notifier for high-risk tool calls. `C`: the clock.
///
/// `N: NotifyAdapter` is a type parameter rather than `Arc<dyn
/// NotifyAdapter>` because the trait requires `Clone`, which is not
/// object-safe — the same reasoning `lugh_pool::PoolCoordinator<C>` applies
/// to its clock.
pub struct Orchestrator<A: ChatAdapter, S: AssistantSession, N: NotifyAdapter, C: Clock = SystemClock> {
    store: Arc<Mutex<Store>>,
    isolation: Arc<IsolationManager>,
    pool: Arc<PoolCoordinator<C>>,
    session_backend: Arc<S>,
    adapter: Arc<A>,
    notifier: N,
    clock: C,
    workspace_base: PathBuf,
    default_branch: String,
    aborts: AbortRegistry,
}

impl<A, S, N, C> Orchestrator<A, S, N, C>
where
    A: ChatAdapter,
    S: AssistantSession,
    N: NotifyAdapter,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Mutex<Store>>,
        isolation: Arc<IsolationManager>,
        pool: Arc<PoolCoordinator<C>>,
        session_backend: Arc<S>,
        adapter: Arc<A>,
        notifier: N,
        clock: C,
        workspace_base: PathBuf,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            store,
            isolation,
            pool,
            session_backend,
            adapter,
            notifier,
            clock,
            workspace_base,
            default_branch: default_branch.into(),
            aborts: AbortRegistry::new(),
        }
    }

    /// Run the spec §4.8 state machine for one incoming message. Never
    /// returns a raw error to the caller's adapter: on failure, a user-safe
    /// message is sent and the classified error is returned for logging.
    pub async fn handle_message(&self, req: IncomingMessage, now_ms: u64) -> Result<(), OrchestratorError> {
        let platform_conversation_id = req.key.platform_conversation_id.clone();
        match self.handle_message_inner(req, now_ms).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "orchestrator request failed");
                let message = user_safe_message(&err);
                let _ = self.adapter.send_message(&platform_conversation_id, &message).await;
                Err(err)
            }
        }
    }

    async fn handle_message_inner(&self, req: IncomingMessage, now_ms: u64) -> Result<(), OrchestratorError> {
        let conversation = self.load_or_create_conversation(&req, now_ms).await?;
        let platform_conversation_id = conversation.key.platform_conversation_id.clone();

        let class = classify(&req.text);

        // Step 2: command classification.
        let (prompt, command_name) = match class {
            Some(CommandClass::BuiltIn { name, args }) => {
                let outcome = self.run_builtin(&conversation, &name, &args, now_ms).await?;
                if let Some(swarm_request) = outcome.swarm_request {
                    let task_id = self
                        .pool
                        .submit(conversation.id.clone(), "swarm", None, serde_json::json!({ "request": swarm_request }), now_ms)
                        .await
                        .map_err(|e| classify_external(ExternalError::Pool(e)))?;
                    self.send(&platform_conversation_id, &format!("Submitted swarm task {task_id}.")).await?;
                    return Ok(());
                }
                self.send(&platform_conversation_id, &outcome.message).await?;
                if let Some(follow_up) = outcome.follow_up_prompt {
                    (follow_up, Some(name))
                } else {
                    return Ok(());
                }
            }
            Some(CommandClass::CodebaseCommand { name, args }) => {
                let store = self.store.lock().await;
                let codebase_id = conversation
                    .codebase_id
                    .as_ref()
                    .ok_or_else(|| OrchestratorError::UserInput("no codebase set for this conversation".to_string()))?;
                let codebase = store
                    .state()
                    .codebases
                    .get(&codebase_id.to_string())
                    .ok_or_else(|| OrchestratorError::NotFound(format!("codebase {codebase_id} not found")))?;
                let body = codebase
                    .command(&name)
                    .ok_or_else(|| OrchestratorError::NotFound(format!("codebase command '{name}' not found")))?;
                (render_codebase_command(body, &args, None), Some(name))
            }
            Some(CommandClass::Template { name, args }) => {
                let store = self.store.lock().await;
                let template = store
                    .state()
                    .templates
                    .get(&name)
                    .ok_or_else(|| OrchestratorError::UserInput(format!("unknown command /{name}")))?;
                (render_router(&template.body, &args.join(" ")), Some(name))
            }
            None => {
                // Step 3: router.
                let store = self.store.lock().await;
                let has_codebase = conversation.codebase_id.is_some();
                match store.state().templates.get("router") {
                    Some(router) if has_codebase => (render_router(&router.body, &req.text), None),
                    _ => (req.text.clone(), None),
                }
            }
        };

        // Step 4: thread context.
        let prompt = match &req.thread_context {
            Some(ctx) => format!("### Thread context\n{ctx}\n\n{prompt}"),
            None => prompt,
        };

        // Step 5: isolation resolution.
        let (conversation, cwd) = self.resolve_isolation(conversation, &req, now_ms).await?;

        // Step 6: session resolution.
        let session = self.resolve_session(&conversation, command_name.as_deref(), now_ms).await?;

        // Step 7: abort handle.
        let abort_handle = self.aborts.install(conversation.id.clone()).await;

        // Step 8: stream.
        let previous_handle = session.external_session_id.as_ref().map(|id| id.as_str().to_string());
        let mut rx = self
            .session_backend
            .send_query(&prompt, &cwd, previous_handle.as_deref())
            .await
            .map_err(|e| classify_external(ExternalError::Session(e)))?;

        let mut response_buffer = String::new();
        let mut written_files: Vec<PathBuf> = Vec::new();
        let mut external_session_id = session.external_session_id.clone();
        let mut aborted = false;

        let cancellation = abort_handle.token();
        loop {
            let event = tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    aborted = true;
                    break;
                }
                event = rx.recv() => event,
            };
            match event {
                Some(AssistantEvent::Assistant { content }) => match self.adapter.streaming_mode() {
                    StreamingMode::Stream => self.send(&platform_conversation_id, &content).await?,
                    StreamingMode::Batch => response_buffer.push_str(&content),
                },
                Some(AssistantEvent::Tool { tool_name, tool_input }) => {
                    self.send(&platform_conversation_id, &format!("🔧 {tool_name}")).await?;
                    if let Some(path) = written_path(&tool_name, &tool_input, &cwd) {
                        written_files.push(path);
                    }
                    let risk = classify_tool_risk(&tool_name, &tool_input);
                    if risk != RiskLevel::Low {
                        self.record_approval(&conversation.id, &tool_name, &tool_input, risk, now_ms).await?;
                        if risk == RiskLevel::High && env::notify_on_risk_tools() {
                            let _ = self.notifier.notify("High-risk tool call", &tool_name).await;
                        }
                    }
                }
                Some(AssistantEvent::Result { session_id }) => {
                    external_session_id = Some(session_id.into());
                    break;
                }
                None => break,
            }
        }

        // Step 9: post-processing.
        if !aborted {
            if let StreamingMode::Batch = self.adapter.streaming_mode() {
                let filtered = filter_tool_indicators(&response_buffer);
                match split_long_response(&self.workspace_base, conversation.id.as_str(), &filtered)
                    .await
                    .map_err(|e| OrchestratorError::ExternalIo(ExternalError::Store(lugh_storage::StoreError::Io(e))))?
                {
                    Some(split) => {
                        self.send(&platform_conversation_id, &split.preview).await?;
                        let _ = self.adapter.send_file(&platform_conversation_id, &split.full_text_path, None).await;
                    }
                    None => self.send(&platform_conversation_id, &filtered).await?,
                }
            }
            for path in &written_files {
                if is_auto_send_eligible(path).await {
                    let _ = self.adapter.send_file(&platform_conversation_id, path, None).await;
                }
            }
        }

        self.finalize_session(&session, external_session_id, command_name.as_deref(), now_ms).await?;

        // Step 10: abort finalization.
        self.aborts.clear(&conversation.id).await;
        if aborted {
            self.send(&platform_conversation_id, "Interrupted.").await?;
        }

        Ok(())
    }

    async fn send(&self, conversation_id: &str, text: &str) -> Result<(), OrchestratorError> {
        self.adapter
            .send_message(conversation_id, text)
            .await
            .map_err(|e| classify_external(ExternalError::Adapter(e)))
    }

    async fn load_or_create_conversation(
        &self,
        req: &IncomingMessage,
        now_ms: u64,
    ) -> Result<Conversation, OrchestratorError> {
        let mut store = self.store.lock().await;
        if let Some(existing) = store.state().find_conversation_by_key(&req.key) {
            return Ok(existing.clone());
        }

        let mut conversation = Conversation::new(req.key.clone(), &req.assistant_kind, now_ms);
        conversation.parent_conversation_id = req.parent_conversation_id.clone();

        // Inherit codebase from the parent conversation when this thread has
        // none of its own yet (spec §4.8 step 1).
        if let Some(parent_id) = &req.parent_conversation_id {
            if let Some(parent) = store.state().conversations.get(&parent_id.to_string()) {
                conversation.codebase_id = parent.codebase_id.clone();
            }
        }

        store
            .apply(Event::ConversationCreated { conversation: conversation.clone() })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        info!(conversation_id = %conversation.id, "created conversation");
        Ok(conversation)
    }

    async fn resolve_isolation(
        &self,
        mut conversation: Conversation,
        req: &IncomingMessage,
        now_ms: u64,
    ) -> Result<(Conversation, PathBuf), OrchestratorError> {
        let Some(codebase_id) = conversation.codebase_id.clone() else {
            return Ok((conversation, self.workspace_base.clone()));
        };

        let (workflow_type, workflow_id) =
            req.workflow.clone().unwrap_or((WorkflowType::Thread, conversation.id.to_string()));
        let existing_env_id = conversation.isolation_env_id.as_deref().map(|s| IsolationEnvId::from(s));

        let resolve_req = ResolveRequest {
            codebase_id,
            workflow_type,
            workflow_id,
            existing_env_id,
            hints: req.hints.clone(),
            creator_platform: self.adapter.platform_type().to_string(),
            default_branch: self.default_branch.clone(),
        };
        let env = self
            .isolation
            .resolve(resolve_req, now_ms)
            .await
            .map_err(|e| classify_external(ExternalError::Isolation(e)))?;

        let changed = conversation.isolation_env_id.as_deref() != Some(env.id.as_str());
        if changed {
            let mut store = self.store.lock().await;
            store
                .apply(Event::ConversationIsolationSet {
                    conversation_id: conversation.id.to_string(),
                    isolation_env_id: Some(env.id.to_string()),
                })
                .map_err(|e| classify_external(ExternalError::Store(e)))?;
            if let Some(active) = store.state().active_session_for(conversation.id.as_str()) {
                store
                    .apply(Event::SessionDeactivated { session_id: active.id.to_string(), at_ms: now_ms })
                    .map_err(|e| classify_external(ExternalError::Store(e)))?;
            }
            conversation.isolation_env_id = Some(env.id.to_string());
        }

        Ok((conversation, PathBuf::from(env.path)))
    }

    async fn resolve_session(
        &self,
        conversation: &Conversation,
        command_name: Option<&str>,
        now_ms: u64,
    ) -> Result<Session, OrchestratorError> {
        let mut store = self.store.lock().await;
        let active = store.state().active_session_for(conversation.id.as_str()).cloned();

        let needs_reset = match (&active, command_name) {
            (Some(session), Some("execute")) => session.last_command() == Some("plan-feature"),
            (Some(session), Some("execute-github")) => session.last_command() == Some("plan-feature-github"),
            _ => false,
        };

        if let Some(session) = active {
            if !needs_reset {
                return Ok(session);
            }
            store
                .apply(Event::SessionDeactivated { session_id: session.id.to_string(), at_ms: now_ms })
                .map_err(|e| classify_external(ExternalError::Store(e)))?;
        }

        let mut session = Session::new(conversation.id.clone(), &conversation.assistant_kind, now_ms);
        session.codebase_id = conversation.codebase_id.as_ref().map(|id| id.to_string());
        store
            .apply(Event::SessionCreated { session: session.clone() })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(session)
    }

    async fn finalize_session(
        &self,
        session: &Session,
        external_session_id: Option<lugh_core::SessionId>,
        command_name: Option<&str>,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        let mut updated = session.clone();
        updated.external_session_id = external_session_id;
        updated.last_activity_at_ms = now_ms;
        if let Some(name) = command_name {
            updated.set_last_command(name);
        }
        let mut store = self.store.lock().await;
        store
            .apply(Event::SessionUpdated { session: updated })
            .map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(())
    }

    async fn record_approval(
        &self,
        conversation_id: &ConversationId,
        tool_name: &str,
        tool_input: &serde_json::Value,
        risk: RiskLevel,
        now_ms: u64,
    ) -> Result<(), OrchestratorError> {
        let summary: String = tool_input.to_string().chars().take(200).collect();
        let approval = lugh_core::Approval::new(conversation_id.clone(), tool_name, risk, summary, now_ms);
        let mut store = self.store.lock().await;
        store.apply(Event::ApprovalRecorded { approval }).map_err(|e| classify_external(ExternalError::Store(e)))?;
        Ok(())
    }
}

/// Best-effort detection of a file write from a tool call (spec §4.8 step 8
/// "track file writes for auto-send"). Looks for a `file_path`/`path` string
/// field when the tool name suggests a write, and resolves it against `cwd`.
fn written_path(tool_name: &str, tool_input: &serde_json::Value, cwd: &std::path::Path) -> Option<PathBuf> {
    let lowered = tool_name.to_lowercase();
    if !(lowered.contains("write") || lowered.contains("edit")) {
        return None;
    }
    let path_str = tool_input.get("file_path").or_else(|| tool_input.get("path"))?.as_str()?;
    let path = PathBuf::from(path_str);
    Some(if path.is_absolute() { path } else { cwd.join(path) })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
