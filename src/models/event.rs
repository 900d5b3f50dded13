use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::stats::TokenUsage;

/// A decoded transcript line, normalized to a producer-neutral shape.
///
/// The classifier for each producer format maps one raw JSONL line to zero
/// or more of these; the reconstructor and the statistics aggregator never
/// see producer-specific fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Event timestamp, when the line carried a parsable one.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: Option<DateTime<Utc>>) -> Self {
        Self { kind, timestamp }
    }
}

/// The closed set of event kinds the reconstruction pipeline understands.
///
/// Lines whose kind falls outside this set (snapshots, summaries, system
/// notices) are dropped by the classifiers and never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Session-level metadata; fields merge first-wins across events.
    SessionMeta(SessionMetaUpdate),
    /// A plain-text user message. Always completes a turn atomically.
    UserText { text: String },
    /// One assistant text block; consecutive blocks merge into one turn.
    AssistantText { text: String },
    /// An assistant thinking block (rendered only when configured).
    Thinking { text: String },
    /// A request to run a tool. `call_id` is producer-assigned and may be
    /// absent, in which case the reconstructor synthesizes one.
    ToolInvocation {
        call_id: Option<String>,
        name: String,
        input: ToolInput,
    },
    /// A tool result referencing an earlier invocation by call id.
    ToolResult {
        call_id: Option<String>,
        output: String,
    },
    /// A token-usage report, either a per-message delta or a running total.
    TokenUsage {
        usage: TokenUsage,
        semantics: TokenSemantics,
    },
}

/// Session metadata carried by individual events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMetaUpdate {
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// Tool input payload: structured arguments or a raw command string,
/// depending on what the producer recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Json(Value),
    Command(String),
}

impl ToolInput {
    /// Render the input as display text, pretty-printing structured payloads.
    pub fn display_text(&self) -> String {
        match self {
            ToolInput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolInput::Command(cmd) => cmd.clone(),
        }
    }
}

/// How a producer reports token usage.
///
/// `Delta` events are summed; for `Snapshot` events the latest one wins,
/// since those schemas report running totals rather than increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSemantics {
    Delta,
    Snapshot,
}
