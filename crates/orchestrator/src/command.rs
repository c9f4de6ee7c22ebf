// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command classification (spec §4.8 step 2): strip the leading `/`, split
//! into `(command, args[])` respecting quoted strings, and sort the result
//! into one of three classes.

/// Built-in commands, enumerated verbatim from spec §6.3.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "help",
    "status",
    "getcwd",
    "setcwd",
    "clone",
    "repos",
    "repo",
    "repo-remove",
    "reset",
    "reset-context",
    "command-set",
    "load-commands",
    "commands",
    "template-add",
    "template-list",
    "templates",
    "template-delete",
    "worktree",
    "init",
    "verbose",
    "stop",
    "quickref",
    "agents",
    "chains",
    "prompts",
    "commands-all",
];

/// Text the execution envelope is wrapped around to instruct the assistant
/// to run a codebase command template without asking for confirmation
/// (spec §4.8 step 2, glossary "execution envelope").
pub const EXECUTION_ENVELOPE_PREFACE: &str =
    "Run the following exactly as written. Do not ask for confirmation before executing it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandClass {
    BuiltIn { name: String, args: Vec<String> },
    /// `/command-invoke name [args]` (spec §4.8 step 2).
    CodebaseCommand { name: String, args: Vec<String> },
    /// `/<template_name>`, when `name` isn't a built-in or `command-invoke`.
    Template { name: String, args: Vec<String> },
}

/// Classify `text` as a slash command, or `None` if it isn't one (the
/// caller should fall through to the router step, spec §4.8 step 3).
pub fn classify(text: &str) -> Option<CommandClass> {
    let rest = text.trim().strip_prefix('/')?;
    let tokens = tokenize(rest);
    let mut iter = tokens.into_iter();
    let name = iter.next().unwrap_or_default();
    let args: Vec<String> = iter.collect();

    if name == "command-invoke" {
        let mut args = args.into_iter();
        let invoked_name = args.next().unwrap_or_default();
        return Some(CommandClass::CodebaseCommand { name: invoked_name, args: args.collect() });
    }
    if BUILTIN_COMMANDS.contains(&name.as_str()) {
        return Some(CommandClass::BuiltIn { name, args });
    }
    Some(CommandClass::Template { name, args })
}

/// Split `s` on whitespace, treating a `'...'`/`"..."` span as one token.
fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                in_token = true;
                for c2 in chars.by_ref() {
                    if c2 == c {
                        break;
                    }
                    current.push(c2);
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Substitute `$1..$N` and `$ARGUMENTS` into a codebase command's template
/// body (spec §4.8 step 2), then wrap it in the execution envelope.
pub fn render_codebase_command(body: &str, args: &[String], issue_context: Option<&str>) -> String {
    let mut rendered = body.to_string();
    for (i, arg) in args.iter().enumerate() {
        rendered = rendered.replace(&format!("${}", i + 1), arg);
    }
    rendered = rendered.replace("$ARGUMENTS", &args.join(" "));

    let mut envelope = format!("{EXECUTION_ENVELOPE_PREFACE}\n\n{rendered}");
    if let Some(context) = issue_context {
        envelope.push_str("\n\n");
        envelope.push_str(context);
    }
    envelope
}

/// Substitute the whole incoming message into the router template (spec
/// §4.8 step 3). The router body's `$ARGUMENTS` placeholder is replaced
/// with the verbatim message, the same placeholder codebase commands use.
pub fn render_router(body: &str, message: &str) -> String {
    body.replace("$ARGUMENTS", message)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
