//! Markdown rendering of a reconstructed session: a plain, grep-friendly
//! companion to the HTML report.

use std::path::Path;

use crate::models::{Role, Session, ToolInput};
use crate::render::format_datetime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a session as a Markdown document.
pub fn render_markdown(session: &Session, source: &Path) -> String {
    let mut lines: Vec<String> = vec!["# Conversation Export".to_string(), String::new()];

    if let Some(session_id) = &session.meta.session_id {
        lines.push(format!("Session ID: {session_id}"));
    }
    if let Some(created) = &session.meta.created {
        lines.push(format!("Started: {}", format_datetime(created, TIMESTAMP_FORMAT)));
    }
    if let Some(cwd) = &session.meta.cwd {
        lines.push(format!("CWD: {}", cwd.display()));
    }
    lines.push(format!("Source: {}", source.display()));
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    for turn in &session.turns {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let ts = turn
            .timestamp
            .map(|t| format_datetime(&t, TIMESTAMP_FORMAT))
            .unwrap_or_default();

        if !turn.text.trim().is_empty() {
            lines.push(format!("## {role} {ts}").trim_end().to_string());
            lines.push(String::new());
            lines.push(turn.text.clone());
            lines.push(String::new());
        }

        for id in &turn.tool_ids {
            let Some(call) = session.tool_call(id) else {
                continue;
            };
            lines.push(format!("### tool_call {} {ts}", call.name).trim_end().to_string());
            lines.push(String::new());
            let fence_lang = match &call.input {
                ToolInput::Json(_) => "json",
                ToolInput::Command(_) => "",
            };
            lines.push(format!("```{fence_lang}"));
            lines.push(call.input.display_text());
            lines.push("```".to_string());
            lines.push(String::new());
            if let Some(result) = &call.result {
                lines.push("### tool_output".to_string());
                lines.push(String::new());
                lines.push("```".to_string());
                lines.push(result.clone());
                lines.push("```".to_string());
                lines.push(String::new());
            }
        }
    }

    let joined = lines.join("\n");
    format!("{}\n", joined.trim_end())
}
