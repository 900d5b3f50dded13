//! OpenClaw agent session format.
//!
//! Lines are `{"type": "session" | "message", ...}`. A `session` line marks
//! the start timestamp; `message` lines carry `message.role` and
//! `message.content`, the latter either a plain string or a part list
//! mixing `text`, `toolCall` (name + arguments), `tool_use` (name + input)
//! and `tool_result` parts. Messages may carry per-message usage deltas.

use std::path::Path;

use serde_json::Value;

use crate::models::{Event, EventKind, SessionMetaUpdate, TokenSemantics, TokenUsage, ToolInput};
use crate::parsers::deserializers::{parse_timestamp_value, u64_field};
use crate::parsers::TranscriptFormat;
use crate::reconstruct::{OrphanPolicy, ToolAttachment};

pub struct OpenClaw;

impl TranscriptFormat for OpenClaw {
    fn name(&self) -> &'static str {
        "openclaw"
    }

    fn matches_path(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|s| s.contains("/.openclaw/"))
    }

    fn sniff(&self, value: &Value) -> bool {
        match value.get("type").and_then(Value::as_str) {
            Some("session") => true,
            Some("message") => value.get("message").and_then(|m| m.get("role")).is_some(),
            _ => false,
        }
    }

    fn classify(&self, value: &Value) -> Vec<Event> {
        let timestamp = value.get("timestamp").and_then(parse_timestamp_value);

        match value.get("type").and_then(Value::as_str) {
            Some("session") => vec![Event::new(
                EventKind::SessionMeta(SessionMetaUpdate {
                    session_id: value.get("id").and_then(Value::as_str).map(String::from),
                    cwd: None,
                    created: timestamp,
                }),
                timestamp,
            )],
            Some("message") => {
                let Some(message) = value.get("message").filter(|m| m.is_object()) else {
                    return Vec::new();
                };
                classify_message(message, timestamp)
            }
            _ => Vec::new(),
        }
    }

    fn tool_attachment(&self) -> ToolAttachment {
        ToolAttachment::OpenTurn
    }

    fn default_orphan_policy(&self) -> OrphanPolicy {
        OrphanPolicy::Discard
    }
}

fn classify_message(
    message: &Value,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
) -> Vec<Event> {
    let role = message.get("role").and_then(Value::as_str);
    if !matches!(role, Some("user") | Some("assistant")) {
        return Vec::new();
    }
    let is_user = role == Some("user");

    let mut events = Vec::new();
    match message.get("content") {
        Some(Value::String(text)) => push_text(&mut events, is_user, text, timestamp),
        Some(Value::Array(parts)) => {
            // Text parts collapse into one event; tool parts keep their
            // relative order after it.
            let mut text_parts: Vec<&str> = Vec::new();
            let mut tool_events = Vec::new();

            for part in parts {
                match part.get("type").and_then(Value::as_str) {
                    Some("text") => {
                        if let Some(text) = part.get("text").and_then(Value::as_str) {
                            text_parts.push(text);
                        }
                    }
                    Some("toolCall") => tool_events.push(Event::new(
                        EventKind::ToolInvocation {
                            call_id: part.get("id").and_then(Value::as_str).map(String::from),
                            name: tool_name(part),
                            input: ToolInput::Json(
                                part.get("arguments").cloned().unwrap_or(Value::Null),
                            ),
                        },
                        timestamp,
                    )),
                    Some("tool_use") => tool_events.push(Event::new(
                        EventKind::ToolInvocation {
                            call_id: part.get("id").and_then(Value::as_str).map(String::from),
                            name: tool_name(part),
                            input: ToolInput::Json(
                                part.get("input").cloned().unwrap_or(Value::Null),
                            ),
                        },
                        timestamp,
                    )),
                    Some("tool_result") => tool_events.push(Event::new(
                        EventKind::ToolResult {
                            call_id: part
                                .get("tool_use_id")
                                .and_then(Value::as_str)
                                .map(String::from),
                            output: flatten_part_content(part.get("content")),
                        },
                        timestamp,
                    )),
                    _ => {}
                }
            }

            push_text(&mut events, is_user, &text_parts.join("\n"), timestamp);
            events.extend(tool_events);
        }
        _ => {}
    }

    if let Some(usage) = message.get("usage").filter(|u| u.is_object()) {
        events.push(Event::new(
            EventKind::TokenUsage {
                usage: TokenUsage {
                    input_tokens: u64_field(usage, "input_tokens"),
                    output_tokens: u64_field(usage, "output_tokens"),
                    cache_creation_tokens: u64_field(usage, "cache_creation_input_tokens"),
                    cache_read_tokens: u64_field(usage, "cache_read_input_tokens"),
                },
                semantics: TokenSemantics::Delta,
            },
            timestamp,
        ));
    }

    events
}

fn push_text(
    events: &mut Vec<Event>,
    is_user: bool,
    text: &str,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let kind = if is_user {
        EventKind::UserText { text: text.to_string() }
    } else {
        EventKind::AssistantText { text: text.to_string() }
    };
    events.push(Event::new(kind, timestamp));
}

fn tool_name(part: &Value) -> String {
    part.get("name").and_then(Value::as_str).unwrap_or("tool").to_string()
}

fn flatten_part_content(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
