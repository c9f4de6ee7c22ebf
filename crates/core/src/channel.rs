// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub channel name canonicalization (spec §4.1, §9).
//!
//! Publish and subscribe must canonicalize a channel name through the exact
//! same function. A prior implementation applied canonicalization only on
//! the subscribe side, so publishers using unpunctuated names silently
//! dropped messages to subscribers who named their channel differently.

/// Canonicalize a channel name by stripping every byte outside
/// `[A-Za-z0-9_]`. Must be called on both the publish and subscribe path.
pub fn canonicalize_channel(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect()
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
