// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the ops CLI to query the orchestration core.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod query;
mod response;
mod wire;

pub use query::Query;
pub use response::{Response, StatusSummary};
pub use wire::{
    decode, encode, read_message, read_query, write_message, write_response, ProtocolError,
    MAX_MESSAGE_LEN,
};
