//! Conversation reconstruction: folding a classified event stream into an
//! ordered sequence of turns.
//!
//! # Error Handling Strategy
//!
//! Reconstruction never fails. Out-of-order events, unknown call ids and
//! blank messages degrade to orphaned or dropped records rather than
//! aborting the session; a transcript with zero decodable events yields an
//! empty turn sequence. The fold is strictly left-to-right with no
//! lookahead, so running it twice over the same events produces
//! structurally identical output.

use std::collections::HashMap;

use crate::models::{
    Event, EventKind, Role, SessionMeta, SessionMetaUpdate, TokenSemantics, ToolCall, ToolInput,
    Turn,
};

/// Maximum characters of a thinking block inlined into a turn.
const THINKING_PREVIEW_CHARS: usize = 200;

/// Where a tool invocation lands when it arrives outside an open turn.
///
/// Producers that embed invocations in assistant messages open a fresh
/// (possibly empty) assistant turn; producers that emit invocations as
/// free-standing events attach them to the nearest assistant turn instead,
/// queueing until one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolAttachment {
    #[default]
    OpenTurn,
    NearestTurn,
}

/// What happens to a tool result whose call id matches no known invocation.
///
/// The source tools disagree on this, so it is an explicit knob: `Discard`
/// drops the result, `AttachToNearest` synthesizes a free-standing tool
/// entry on the open turn (else the most recently completed turn), or drops
/// it when no turn exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    #[default]
    Discard,
    AttachToNearest,
}

/// Per-run knobs for the reconstruction fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconstructOptions {
    pub tool_attachment: ToolAttachment,
    pub orphan_policy: OrphanPolicy,
    pub include_thinking: bool,
}

/// Output of a completed fold, ready to be combined with statistics into a
/// `Session`.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub meta: SessionMeta,
    pub turns: Vec<Turn>,
    pub tool_calls: HashMap<String, ToolCall>,
}

/// The reconstruction fold state.
///
/// At most one assistant turn is open at a time; user turns complete
/// atomically. All state lives here (no external mutable variables), so a
/// single `(state, event) -> state` step is unit-testable in isolation.
#[derive(Debug)]
pub struct Reconstructor {
    opts: ReconstructOptions,
    turns: Vec<Turn>,
    open: Option<Turn>,
    tool_calls: HashMap<String, ToolCall>,
    /// Invocations seen before any assistant turn exists (`NearestTurn`
    /// attachment only); drained in arrival order when one opens.
    pending: Vec<String>,
    meta: SessionMeta,
    synth_counter: usize,
}

impl Reconstructor {
    pub fn new(opts: ReconstructOptions) -> Self {
        Self {
            opts,
            turns: Vec::new(),
            open: None,
            tool_calls: HashMap::new(),
            pending: Vec::new(),
            meta: SessionMeta::default(),
            synth_counter: 0,
        }
    }

    /// Fold one event into the state. Never fails.
    pub fn push(&mut self, event: &Event) {
        match &event.kind {
            EventKind::SessionMeta(update) => self.merge_meta(update),
            EventKind::UserText { text } => self.push_user_text(text, event),
            EventKind::AssistantText { text } => self.push_assistant_text(text, event),
            EventKind::Thinking { text } => self.push_thinking(text),
            EventKind::ToolInvocation { call_id, name, input } => {
                self.push_invocation(call_id.as_deref(), name, input, event);
            }
            EventKind::ToolResult { call_id, output } => {
                self.push_result(call_id.as_deref(), output, event);
            }
            EventKind::TokenUsage { usage, semantics } => {
                // Per-message deltas annotate the turn they belong to;
                // running totals are an aggregator concern only.
                if *semantics == TokenSemantics::Delta
                    && let Some(turn) = self.open.as_mut()
                {
                    turn.usage = Some(usage.clone());
                }
            }
        }
    }

    /// Run the fold over a whole event sequence.
    pub fn fold(mut self, events: &[Event]) -> Reconstruction {
        for event in events {
            self.push(event);
        }
        self.finish()
    }

    /// Flush any open turn and hand back the reconstructed conversation.
    pub fn finish(mut self) -> Reconstruction {
        self.flush_open();

        // Invocations still pending at end of stream attach to the last
        // completed turn; with no turns at all they stay reachable through
        // the tool map only.
        if !self.pending.is_empty()
            && let Some(last) = self.turns.last_mut()
        {
            last.tool_ids.append(&mut self.pending);
        }

        Reconstruction { meta: self.meta, turns: self.turns, tool_calls: self.tool_calls }
    }

    fn merge_meta(&mut self, update: &SessionMetaUpdate) {
        // First writer wins for every field.
        if self.meta.session_id.is_none() {
            self.meta.session_id = update.session_id.clone();
        }
        if self.meta.cwd.is_none() {
            self.meta.cwd = update.cwd.as_ref().map(Into::into);
        }
        if self.meta.created.is_none() {
            self.meta.created = update.created;
        }
    }

    fn push_user_text(&mut self, text: &str, event: &Event) {
        self.flush_open();
        let turn = Turn::new(Role::User, text, event.timestamp);
        if !turn.is_empty() {
            self.turns.push(turn);
        }
    }

    fn push_assistant_text(&mut self, text: &str, event: &Event) {
        match self.open.as_mut() {
            Some(turn) => {
                if turn.text.is_empty() {
                    turn.text = text.to_string();
                } else {
                    turn.text.push_str("\n\n");
                    turn.text.push_str(text);
                }
            }
            None => self.open_assistant_turn(text, event),
        }
    }

    fn push_thinking(&mut self, text: &str) {
        if !self.opts.include_thinking {
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(turn) = self.open.as_mut() {
            let preview: String = if text.chars().count() > THINKING_PREVIEW_CHARS {
                let cut: String = text.chars().take(THINKING_PREVIEW_CHARS).collect();
                format!("{cut}...")
            } else {
                text.to_string()
            };
            let tag = format!("*[Thinking: {preview}]*");
            if turn.text.is_empty() {
                turn.text = tag;
            } else {
                turn.text.push_str("\n\n");
                turn.text.push_str(&tag);
            }
        }
    }

    fn push_invocation(
        &mut self,
        call_id: Option<&str>,
        name: &str,
        input: &ToolInput,
        event: &Event,
    ) {
        let id = match call_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.next_synth_id(),
        };

        // Call-id collisions overwrite: producers assign ids fresh per call.
        self.tool_calls.insert(
            id.clone(),
            ToolCall {
                name: name.to_string(),
                input: input.clone(),
                timestamp: event.timestamp,
                result: None,
            },
        );

        match self.opts.tool_attachment {
            ToolAttachment::OpenTurn => {
                let turn = self
                    .open
                    .get_or_insert_with(|| Turn::new(Role::Assistant, "", event.timestamp));
                turn.tool_ids.push(id);
            }
            ToolAttachment::NearestTurn => {
                if let Some(turn) = self.open.as_mut() {
                    turn.tool_ids.push(id);
                } else if let Some(turn) =
                    self.turns.iter_mut().rev().find(|t| t.role == Role::Assistant)
                {
                    turn.tool_ids.push(id);
                } else {
                    self.pending.push(id);
                }
            }
        }
    }

    fn push_result(&mut self, call_id: Option<&str>, output: &str, event: &Event) {
        if let Some(call) = call_id.and_then(|id| self.tool_calls.get_mut(id)) {
            // First write wins; duplicate results for one id are ignored.
            if call.result.is_none() {
                call.result = Some(output.to_string());
            }
            return;
        }

        match self.opts.orphan_policy {
            OrphanPolicy::Discard => {}
            OrphanPolicy::AttachToNearest => {
                let target_exists = self.open.is_some() || !self.turns.is_empty();
                if !target_exists {
                    // No turn to attach to yet: the result is dropped.
                    return;
                }
                let id = self.next_synth_id();
                self.tool_calls.insert(
                    id.clone(),
                    ToolCall {
                        name: "tool_output".to_string(),
                        input: ToolInput::Command(String::new()),
                        timestamp: event.timestamp,
                        result: Some(output.to_string()),
                    },
                );
                if let Some(turn) = self.open.as_mut() {
                    turn.tool_ids.push(id);
                } else if let Some(turn) = self.turns.last_mut() {
                    turn.tool_ids.push(id);
                }
            }
        }
    }

    fn open_assistant_turn(&mut self, text: &str, event: &Event) {
        let mut turn = Turn::new(Role::Assistant, text, event.timestamp);
        // Queued invocations attach in arrival order before anything else.
        turn.tool_ids.append(&mut self.pending);
        self.open = Some(turn);
    }

    fn flush_open(&mut self) {
        if let Some(turn) = self.open.take()
            && !turn.is_empty()
        {
            self.turns.push(turn);
        }
    }

    fn next_synth_id(&mut self) -> String {
        self.synth_counter += 1;
        format!("synth-{}", self.synth_counter)
    }
}
