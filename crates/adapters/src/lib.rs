// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lugh-adapters: the two external contracts the orchestrator consumes —
//! a chat platform adapter (spec §6.1) and an AI assistant session backend
//! (spec §6.2) — plus scriptable fakes of each for the orchestrator's own
//! test suite.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod ai_session;
pub mod chat;
pub mod notify;

pub use ai_session::{drain_to_result, AssistantEvent, AssistantSession, SessionError};
pub use chat::{AdapterError, ChatAdapter, StreamingMode};
pub use notify::{NotifyAdapter, NotifyError};

#[cfg(any(test, feature = "test-support"))]
pub use ai_session::FakeAssistantSession;
#[cfg(any(test, feature = "test-support"))]
pub use chat::{FakeChatAdapter, SentMessage};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
