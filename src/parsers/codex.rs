//! Codex CLI rollout format.
//!
//! Every line is an envelope `{"timestamp", "type", "payload"}`. Session
//! metadata arrives once as `session_meta`; conversation items arrive as
//! `response_item` payloads (`message`, `function_call`,
//! `function_call_output`); running token totals arrive as `event_msg`
//! payloads of type `token_count`. Tool calls are free-standing events
//! here, not embedded in messages, so they attach to the nearest assistant
//! turn during reconstruction.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{Event, EventKind, SessionMetaUpdate, TokenSemantics, TokenUsage, ToolInput};
use crate::parsers::deserializers::{parse_timestamp_value, u64_field};
use crate::parsers::TranscriptFormat;
use crate::reconstruct::{OrphanPolicy, ToolAttachment};

pub struct Codex;

#[derive(Debug, Deserialize)]
struct RawSessionMeta {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl TranscriptFormat for Codex {
    fn name(&self) -> &'static str {
        "codex"
    }

    fn matches_path(&self, path: &Path) -> bool {
        let in_codex_dir = path.to_str().is_some_and(|s| s.contains("/.codex/"));
        let rollout_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("rollout-") && n.ends_with(".jsonl"));
        in_codex_dir || rollout_file
    }

    fn sniff(&self, value: &Value) -> bool {
        matches!(
            value.get("type").and_then(Value::as_str),
            Some("session_meta") | Some("response_item") | Some("event_msg")
        ) && value.get("payload").is_some()
    }

    fn classify(&self, value: &Value) -> Vec<Event> {
        let timestamp = value.get("timestamp").and_then(parse_timestamp_value);
        let Some(payload) = value.get("payload").filter(|p| p.is_object()) else {
            return Vec::new();
        };

        match value.get("type").and_then(Value::as_str) {
            Some("session_meta") => {
                let meta: RawSessionMeta =
                    serde_json::from_value(payload.clone()).unwrap_or(RawSessionMeta {
                        id: None,
                        cwd: None,
                        timestamp: None,
                    });
                let created =
                    meta.timestamp.as_ref().and_then(parse_timestamp_value).or(timestamp);
                vec![Event::new(
                    EventKind::SessionMeta(SessionMetaUpdate {
                        session_id: meta.id,
                        cwd: meta.cwd,
                        created,
                    }),
                    timestamp,
                )]
            }
            Some("event_msg") => {
                if payload.get("type").and_then(Value::as_str) != Some("token_count") {
                    return Vec::new();
                }
                // Codex reports running totals, not per-event deltas.
                let totals = payload
                    .get("info")
                    .and_then(|info| info.get("total_token_usage"))
                    .cloned()
                    .unwrap_or(Value::Null);
                if !totals.is_object() {
                    return Vec::new();
                }
                vec![Event::new(
                    EventKind::TokenUsage {
                        usage: TokenUsage {
                            input_tokens: u64_field(&totals, "input_tokens"),
                            output_tokens: u64_field(&totals, "output_tokens"),
                            cache_creation_tokens: 0,
                            cache_read_tokens: u64_field(&totals, "cached_input_tokens"),
                        },
                        semantics: TokenSemantics::Snapshot,
                    },
                    timestamp,
                )]
            }
            Some("response_item") => classify_response_item(payload, timestamp),
            _ => Vec::new(),
        }
    }

    fn tool_attachment(&self) -> ToolAttachment {
        ToolAttachment::NearestTurn
    }

    fn default_orphan_policy(&self) -> OrphanPolicy {
        OrphanPolicy::AttachToNearest
    }
}

fn classify_response_item(
    payload: &Value,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
) -> Vec<Event> {
    match payload.get("type").and_then(Value::as_str) {
        Some("message") => {
            let role = payload.get("role").and_then(Value::as_str).unwrap_or("unknown");
            let text = message_text(payload);
            if text.is_empty() {
                return Vec::new();
            }
            let kind = if role == "user" {
                EventKind::UserText { text }
            } else {
                EventKind::AssistantText { text }
            };
            vec![Event::new(kind, timestamp)]
        }
        Some("function_call") => vec![Event::new(
            EventKind::ToolInvocation {
                call_id: payload.get("call_id").and_then(Value::as_str).map(String::from),
                name: payload
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("tool")
                    .to_string(),
                input: ToolInput::Command(
                    payload.get("arguments").and_then(Value::as_str).unwrap_or("").to_string(),
                ),
            },
            timestamp,
        )],
        Some("function_call_output") => vec![Event::new(
            EventKind::ToolResult {
                call_id: payload.get("call_id").and_then(Value::as_str).map(String::from),
                output: payload.get("output").and_then(Value::as_str).unwrap_or("").to_string(),
            },
            timestamp,
        )],
        _ => Vec::new(),
    }
}

/// Concatenate the text items of a `message` payload, which mix
/// `input_text` (user) and `output_text` (assistant) items.
fn message_text(payload: &Value) -> String {
    let Some(items) = payload.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    let mut text = String::new();
    for item in items {
        if matches!(
            item.get("type").and_then(Value::as_str),
            Some("input_text") | Some("output_text")
        ) && let Some(part) = item.get("text").and_then(Value::as_str)
        {
            text.push_str(part);
        }
    }
    text.trim().to_string()
}
