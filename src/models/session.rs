use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::models::event::ToolInput;
use crate::models::stats::{SessionStats, TokenUsage};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One contiguous contribution by a single role, possibly bundling several
/// tool invocations.
///
/// Invariant: a completed turn always has non-blank text or at least one
/// tool id; turns that would violate this are dropped at flush time and
/// never enter [`Session::turns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    /// Merged text content; assistant blocks are joined by a blank line.
    pub text: String,
    /// Call ids into [`Session::tool_calls`], in invocation order.
    pub tool_ids: Vec<String>,
    /// Timestamp of the first event that contributed to this turn.
    pub timestamp: Option<DateTime<Utc>>,
    /// Per-turn token usage, when the producer reports per-message deltas.
    pub usage: Option<TokenUsage>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self { role, text: text.into(), tool_ids: Vec::new(), timestamp, usage: None }
    }

    /// A turn with neither text nor tool invocations carries no content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.tool_ids.is_empty()
    }
}

/// A tool invocation reconstructed from the transcript.
///
/// The result slot starts unset and is written at most once, by the first
/// matching result event; later duplicates are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub input: ToolInput,
    pub timestamp: Option<DateTime<Utc>>,
    pub result: Option<String>,
}

/// Session-level metadata, merged first-wins from metadata-bearing events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMeta {
    pub session_id: Option<String>,
    pub cwd: Option<PathBuf>,
    pub created: Option<DateTime<Utc>>,
}

/// The fully reconstructed record of one transcript file.
///
/// Renderers consume this value alone; no further access to the raw
/// transcript is needed to produce HTML or Markdown output.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub meta: SessionMeta,
    pub turns: Vec<Turn>,
    pub tool_calls: HashMap<String, ToolCall>,
    pub stats: SessionStats,
}

impl Session {
    /// Look up a tool call by the id stored on a turn.
    pub fn tool_call(&self, id: &str) -> Option<&ToolCall> {
        self.tool_calls.get(id)
    }
}
