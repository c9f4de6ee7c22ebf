// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response post-processing (spec §4.8 step 6): auto file send eligibility,
//! long-response splitting, and batch-mode tool-indicator filtering.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Default `LONG_RESPONSE_THRESHOLD` (spec §6.6), chars.
pub const LONG_RESPONSE_THRESHOLD: usize = 2000;

const MAX_AUTO_SEND_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "yaml", "yml", "toml", "rs", "py", "js", "ts", "go", "java", "c", "h", "cpp", "hpp", "sh",
    "css", "html", "xml", "csv", "log", "diff", "patch",
];

const BLOCKED_SUFFIXES: &[&str] =
    &[".lock", ".lockb", ".o", ".so", ".dylib", ".dll", ".exe", ".class", ".pyc", ".bin"];

const BLOCKED_DIR_SEGMENTS: &[&str] = &["target", "node_modules", "dist", "build", ".git"];

/// Lines the assistant emits to narrate a tool call in batch mode, e.g.
/// `⚙ running tests...`. Stripped from the final assembled message.
const TOOL_INDICATOR_GLYPHS: &[&str] = &["⚙", "🔧", "▶", "→ running", "$ "];

/// Whether a written file should be attached to the outbound message (spec
/// §4.8 "Auto file send").
pub async fn is_auto_send_eligible(path: &Path) -> bool {
    if is_hidden(path) || has_blocked_segment(path) || has_blocked_suffix(path) {
        return false;
    }
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
        return false;
    }
    match fs::metadata(path).await {
        Ok(metadata) => metadata.len() <= MAX_AUTO_SEND_BYTES,
        Err(_) => false,
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.'))
}

fn has_blocked_segment(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str().to_str().is_some_and(|s| BLOCKED_DIR_SEGMENTS.contains(&s))
    })
}

fn has_blocked_suffix(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return true };
    BLOCKED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Result of splitting a long batch-mode response (spec §4.8 "Long response
/// split").
pub struct SplitResponse {
    pub preview: String,
    pub full_text_path: PathBuf,
}

/// If `text` exceeds `LONG_RESPONSE_THRESHOLD`, write it to
/// `{workspace_base}/responses/{conversation_id}.txt` and return a preview
/// plus that path. Otherwise `Ok(None)`.
pub async fn split_long_response(
    workspace_base: &Path,
    conversation_id: &str,
    text: &str,
) -> std::io::Result<Option<SplitResponse>> {
    if text.chars().count() <= LONG_RESPONSE_THRESHOLD {
        return Ok(None);
    }
    let dir = workspace_base.join("responses");
    fs::create_dir_all(&dir).await?;
    let full_text_path = dir.join(format!("{conversation_id}.txt"));
    fs::write(&full_text_path, text).await?;

    let preview: String = text.chars().take(LONG_RESPONSE_THRESHOLD).collect();
    Ok(Some(SplitResponse { preview, full_text_path }))
}

/// Drop lines starting with a known tool-indicator glyph (spec §4.8 "Batch
/// mode filtering"). Falls back to the unfiltered text if filtering would
/// empty the result.
pub fn filter_tool_indicators(text: &str) -> String {
    let filtered: Vec<&str> = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !TOOL_INDICATOR_GLYPHS.iter().any(|glyph| trimmed.starts_with(glyph))
        })
        .collect();
    let joined = filtered.join("\n");
    if joined.trim().is_empty() {
        text.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
#[path = "postprocess_tests.rs"]
mod tests;
