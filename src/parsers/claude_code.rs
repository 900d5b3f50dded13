//! Claude Code transcript format.
//!
//! Lines are `{"type": "user" | "assistant", "message": {...}, ...}` with
//! entry-level `timestamp`, `sessionId` and `cwd`. User content is either a
//! plain string (an actual prompt) or a block list carrying `tool_result`
//! blocks; assistant content is a block list of `text` / `thinking` /
//! `tool_use`. Assistant messages carry per-message token usage deltas.
//! Other entry types (summary, system, file-history-snapshot, result, ...)
//! are ignorable.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{Event, EventKind, SessionMetaUpdate, TokenSemantics, TokenUsage, ToolInput};
use crate::parsers::deserializers::parse_timestamp_value;
use crate::parsers::TranscriptFormat;
use crate::reconstruct::{OrphanPolicy, ToolAttachment};

pub struct ClaudeCode;

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default, deserialize_with = "lenient_usage")]
    usage: Option<RawUsage>,
}

/// A malformed usage object degrades to "no usage" instead of failing the
/// whole message.
fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<RawUsage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<Value>),
    // Anything else (null, objects) degrades to "no content".
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
}

impl From<RawUsage> for TokenUsage {
    fn from(raw: RawUsage) -> Self {
        TokenUsage {
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            cache_creation_tokens: raw.cache_creation_input_tokens,
            cache_read_tokens: raw.cache_read_input_tokens,
        }
    }
}

impl TranscriptFormat for ClaudeCode {
    fn name(&self) -> &'static str {
        "claude-code"
    }

    fn matches_path(&self, path: &Path) -> bool {
        path.to_str().is_some_and(|s| s.contains("/.claude/"))
    }

    fn sniff(&self, value: &Value) -> bool {
        match value.get("type").and_then(Value::as_str) {
            Some("user") | Some("assistant") => {
                value.get("message").and_then(|m| m.get("role")).is_some()
            }
            Some("summary") => value.get("leafUuid").is_some(),
            _ => false,
        }
    }

    fn classify(&self, value: &Value) -> Vec<Event> {
        let timestamp = value.get("timestamp").and_then(parse_timestamp_value);
        let mut events = Vec::new();

        // Session metadata rides on every entry; the reconstructor keeps
        // the first value it sees per field.
        let session_id = value.get("sessionId").and_then(Value::as_str);
        let cwd = value.get("cwd").and_then(Value::as_str);
        if session_id.is_some() || cwd.is_some() {
            events.push(Event::new(
                EventKind::SessionMeta(SessionMetaUpdate {
                    session_id: session_id.map(String::from),
                    cwd: cwd.map(String::from),
                    created: None,
                }),
                timestamp,
            ));
        }

        let message: Option<RawMessage> = value
            .get("message")
            .cloned()
            .and_then(|m| serde_json::from_value(m).ok());

        match value.get("type").and_then(Value::as_str) {
            Some("user") => {
                match message.and_then(|m| m.content) {
                    Some(RawContent::Text(text)) => {
                        events.push(Event::new(EventKind::UserText { text }, timestamp));
                    }
                    Some(RawContent::Blocks(blocks)) => {
                        // List content on a user entry carries tool results
                        // routed back through the user role, not prompt text.
                        for block in &blocks {
                            if block.get("type").and_then(Value::as_str) == Some("tool_result") {
                                events.push(Event::new(
                                    EventKind::ToolResult {
                                        call_id: block
                                            .get("tool_use_id")
                                            .and_then(Value::as_str)
                                            .map(String::from),
                                        output: flatten_result_content(block.get("content")),
                                    },
                                    timestamp,
                                ));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Some("assistant") => {
                let Some(message) = message else {
                    return events;
                };
                if let Some(RawContent::Blocks(blocks)) = &message.content {
                    for block in blocks {
                        events.extend(classify_assistant_block(block, timestamp));
                    }
                } else if let Some(RawContent::Text(text)) = message.content {
                    let text = text.trim();
                    if !text.is_empty() {
                        events.push(Event::new(
                            EventKind::AssistantText { text: text.to_string() },
                            timestamp,
                        ));
                    }
                }
                if let Some(usage) = message.usage {
                    events.push(Event::new(
                        EventKind::TokenUsage {
                            usage: usage.into(),
                            semantics: TokenSemantics::Delta,
                        },
                        timestamp,
                    ));
                }
            }
            _ => {}
        }

        events
    }

    fn tool_attachment(&self) -> ToolAttachment {
        ToolAttachment::OpenTurn
    }

    fn default_orphan_policy(&self) -> OrphanPolicy {
        OrphanPolicy::Discard
    }
}

fn classify_assistant_block(
    block: &Value,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
) -> Option<Event> {
    match block.get("type").and_then(Value::as_str) {
        Some("text") => {
            let text = block.get("text").and_then(Value::as_str).unwrap_or("").trim();
            (!text.is_empty())
                .then(|| Event::new(EventKind::AssistantText { text: text.to_string() }, timestamp))
        }
        Some("thinking") => {
            let text = block.get("thinking").and_then(Value::as_str).unwrap_or("");
            (!text.trim().is_empty())
                .then(|| Event::new(EventKind::Thinking { text: text.to_string() }, timestamp))
        }
        Some("tool_use") => Some(Event::new(
            EventKind::ToolInvocation {
                call_id: block.get("id").and_then(Value::as_str).map(String::from),
                name: block
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                input: ToolInput::Json(block.get("input").cloned().unwrap_or(Value::Null)),
            },
            timestamp,
        )),
        _ => None,
    }
}

/// Flatten a tool result's content, which may be a plain string or a list
/// of text blocks, into display text.
fn flatten_result_content(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => {
            let texts: Vec<&str> = blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            texts.join("\n")
        }
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn classify(value: Value) -> Vec<Event> {
        ClaudeCode.classify(&value)
    }

    #[test]
    fn test_user_string_content_yields_user_text() {
        let events = classify(json!({
            "type": "user",
            "message": {"role": "user", "content": "hello there"},
            "timestamp": "2026-01-15T10:30:00Z",
            "sessionId": "550e8400-e29b-41d4-a716-446655440000"
        }));

        assert!(events.iter().any(|e| matches!(
            &e.kind,
            EventKind::UserText { text } if text == "hello there"
        )));
        assert!(events.iter().any(|e| matches!(
            &e.kind,
            EventKind::SessionMeta(m) if m.session_id.as_deref()
                == Some("550e8400-e29b-41d4-a716-446655440000")
        )));
    }

    #[test]
    fn test_user_list_content_yields_tool_results_only() {
        let events = classify(json!({
            "type": "user",
            "message": {"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "tool-1", "content": "file contents"},
                {"type": "text", "text": "stray text block"}
            ]}
        }));

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].kind,
            EventKind::ToolResult { call_id: Some(id), output }
                if id == "tool-1" && output == "file contents"
        ));
    }

    #[test]
    fn test_tool_result_list_content_is_flattened() {
        let events = classify(json!({
            "type": "user",
            "message": {"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "t", "content": [
                    {"type": "text", "text": "line one"},
                    {"type": "text", "text": "line two"}
                ]}
            ]}
        }));

        assert!(matches!(
            &events[0].kind,
            EventKind::ToolResult { output, .. } if output == "line one\nline two"
        ));
    }

    #[test]
    fn test_assistant_blocks_yield_text_tools_and_usage() {
        let events = classify(json!({
            "type": "assistant",
            "message": {
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Let me look."},
                    {"type": "thinking", "thinking": "hmm"},
                    {"type": "tool_use", "id": "tool-9", "name": "Read",
                     "input": {"file_path": "a.txt"}}
                ],
                "usage": {"input_tokens": 120, "output_tokens": 40,
                          "cache_creation_input_tokens": 7, "cache_read_input_tokens": 3}
            },
            "timestamp": "2026-01-15T10:31:00Z"
        }));

        assert!(matches!(&events[0].kind, EventKind::AssistantText { text } if text == "Let me look."));
        assert!(matches!(&events[1].kind, EventKind::Thinking { .. }));
        assert!(matches!(
            &events[2].kind,
            EventKind::ToolInvocation { call_id: Some(id), name, .. }
                if id == "tool-9" && name == "Read"
        ));
        match &events[3].kind {
            EventKind::TokenUsage { usage, semantics } => {
                assert_eq!(*semantics, TokenSemantics::Delta);
                assert_eq!(usage.input_tokens, 120);
                assert_eq!(usage.output_tokens, 40);
                assert_eq!(usage.cache_creation_tokens, 7);
                assert_eq!(usage.cache_read_tokens, 3);
            }
            other => panic!("expected usage event, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_text_blocks_are_skipped() {
        let events = classify(json!({
            "type": "assistant",
            "message": {"role": "assistant", "content": [{"type": "text", "text": "   "}]}
        }));
        assert!(events.is_empty());
    }

    #[test]
    fn test_non_conversation_entry_types_are_ignorable() {
        for entry in [
            json!({"type": "summary", "summary": "Fix bug", "leafUuid": "x"}),
            json!({"type": "system", "subtype": "init", "content": "booted"}),
            json!({"type": "file-history-snapshot", "messageId": "m1"}),
        ] {
            let meta_free: Vec<Event> = classify(entry)
                .into_iter()
                .filter(|e| !matches!(e.kind, EventKind::SessionMeta(_)))
                .collect();
            assert!(meta_free.is_empty());
        }
    }

    #[test]
    fn test_malformed_usage_degrades_to_no_usage_event() {
        let events = classify(json!({
            "type": "assistant",
            "message": {"role": "assistant",
                        "content": [{"type": "text", "text": "still here"}],
                        "usage": "not-an-object"}
        }));

        assert!(matches!(&events[0].kind, EventKind::AssistantText { text } if text == "still here"));
        assert!(!events.iter().any(|e| matches!(e.kind, EventKind::TokenUsage { .. })));
    }

    #[test]
    fn test_missing_message_degrades_to_no_events() {
        let events = classify(json!({"type": "user", "timestamp": "2026-01-15T10:30:00Z"}));
        assert!(events.is_empty());
    }

    #[test]
    fn test_integer_millis_timestamp_is_accepted() {
        let events = classify(json!({
            "type": "user",
            "message": {"role": "user", "content": "hi"},
            "timestamp": 1762076480016_i64
        }));
        assert!(events[0].timestamp.is_some());
    }

    #[test]
    fn test_sniff() {
        assert!(ClaudeCode.sniff(&json!({
            "type": "user", "message": {"role": "user", "content": "x"}
        })));
        assert!(ClaudeCode.sniff(&json!({"type": "summary", "summary": "s", "leafUuid": "u"})));
        assert!(!ClaudeCode.sniff(&json!({"type": "session_meta", "payload": {}})));
        assert!(!ClaudeCode.sniff(&json!({"type": "message", "message": {"role": "user"}})));
    }
}
