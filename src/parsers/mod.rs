//! JSONL transcript parsing: line decoding, format detection and
//! producer-specific event classification.
//!
//! # Error Handling Strategy
//!
//! This module follows a **graceful degradation** approach suitable for CLI
//! tools:
//!
//! - **Individual line failures**: Malformed JSON lines and non-object
//!   values are skipped, allowing parsing to continue. A skipped-line count
//!   is reported to stderr at end of file, but no amount of bad lines fails
//!   a readable transcript; its decodable remainder is always used.
//! - **Schema mismatch**: Recognized envelopes with unexpected shapes
//!   degrade field-by-field to absent/empty values rather than failing.
//! - **Error propagation**: Only I/O failures (missing or unreadable file)
//!   surface as `anyhow::Result` errors with path context.
//!
//! Each producer format implements [`TranscriptFormat`]; the registry in
//! [`all_formats`] is the single place new producers are added. Everything
//! downstream consumes the canonical [`Event`] shape, so the reconstructor
//! never branches on producer.

pub mod claude_code;
pub mod codex;
pub mod deserializers;
pub mod openclaw;

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::Event;
use crate::reconstruct::{OrphanPolicy, ToolAttachment};
use crate::utils::open_transcript;

pub use claude_code::ClaudeCode;
pub use codex::Codex;
pub use openclaw::OpenClaw;

/// Lines inspected when sniffing an unknown file's format.
const SNIFF_LINES: usize = 25;

/// One producer schema: path/content detection plus the mapping from raw
/// JSONL objects to canonical events.
pub trait TranscriptFormat: Sync {
    /// Stable identifier used in CLI flags and log output.
    fn name(&self) -> &'static str;

    /// Cheap path-based detection (directory layout, file naming).
    fn matches_path(&self, path: &Path) -> bool;

    /// Content-based detection on one decoded line.
    fn sniff(&self, value: &Value) -> bool;

    /// Map one decoded line to zero or more canonical events.
    ///
    /// Unrecognized kinds yield an empty vec; unexpected shapes degrade to
    /// absent fields. This must never fail.
    fn classify(&self, value: &Value) -> Vec<Event>;

    /// Where this producer's tool invocations land relative to turns.
    fn tool_attachment(&self) -> ToolAttachment;

    /// What this producer's code path historically did with results whose
    /// call id is unknown.
    fn default_orphan_policy(&self) -> OrphanPolicy;
}

/// All supported producer formats, in sniffing order.
pub fn all_formats() -> &'static [&'static dyn TranscriptFormat] {
    static FORMATS: [&dyn TranscriptFormat; 3] = [&ClaudeCode, &Codex, &OpenClaw];
    &FORMATS
}

/// Look up a format by its CLI name.
pub fn format_by_name(name: &str) -> Option<&'static dyn TranscriptFormat> {
    all_formats().iter().copied().find(|f| f.name() == name)
}

/// Decode one raw line into a JSON object.
///
/// Empty/whitespace lines, malformed JSON and non-object values all yield
/// "no event"; this never propagates an error for a single bad line.
pub fn decode_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(line).ok().filter(Value::is_object)
}

/// Determine the producer format of a transcript file.
///
/// Path heuristics are tried first, then the leading lines are sniffed.
/// An unrecognizable file falls back to the Claude Code format with a
/// warning: classification of foreign lines yields no events, so the
/// result degrades to an empty session rather than an error.
pub fn detect_format(path: &Path) -> Result<&'static dyn TranscriptFormat> {
    for format in all_formats() {
        if format.matches_path(path) {
            return Ok(*format);
        }
    }

    let file = open_transcript(path)?;
    let reader = BufReader::new(file);
    for line in reader.lines().take(SNIFF_LINES) {
        let line = line.with_context(|| format!("Failed to read from {}", path.display()))?;
        let Some(value) = decode_line(&line) else {
            continue;
        };
        for format in all_formats() {
            if format.sniff(&value) {
                return Ok(*format);
            }
        }
    }

    eprintln!(
        "Warning: could not detect transcript format of {}; assuming claude-code",
        path.display()
    );
    Ok(&ClaudeCode)
}

/// Read a transcript file and classify every decodable line.
///
/// Returns the canonical event sequence in file order. Malformed lines are
/// counted and skipped; only I/O failures are errors.
pub fn read_events(path: &Path, format: &dyn TranscriptFormat) -> Result<Vec<Event>> {
    let file = open_transcript(path)?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line.with_context(|| format!("Failed to read from {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(&line) {
            Some(value) => events.extend(format.classify(&value)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        eprintln!(
            "Warning: skipped {} malformed line(s) in {}",
            skipped,
            path.display()
        );
    }

    Ok(events)
}
