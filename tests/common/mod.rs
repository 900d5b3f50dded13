//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const SESSION_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

/// A Claude Code transcript with one user prompt, one assistant reply with
/// a tool call, the tool result routed back, and a closing answer.
pub fn sample_claude_transcript() -> String {
    [
        format!(
            r#"{{"type":"user","message":{{"role":"user","content":"please fix the bug in login"}},"timestamp":"2026-01-15T10:00:00Z","sessionId":"{SESSION_UUID}","cwd":"/work/demo","uuid":"u1"}}"#
        ),
        format!(
            r#"{{"type":"assistant","message":{{"role":"assistant","content":[{{"type":"text","text":"Let me check the handler."}},{{"type":"tool_use","id":"tool-1","name":"Read","input":{{"file_path":"/work/demo/src/login.rs"}}}}],"usage":{{"input_tokens":1000,"output_tokens":50,"cache_creation_input_tokens":10,"cache_read_input_tokens":5}}}},"timestamp":"2026-01-15T10:00:30Z","sessionId":"{SESSION_UUID}","uuid":"u2"}}"#
        ),
        format!(
            r#"{{"type":"user","message":{{"role":"user","content":[{{"type":"tool_result","tool_use_id":"tool-1","content":"fn login() {{}}"}}]}},"timestamp":"2026-01-15T10:00:45Z","sessionId":"{SESSION_UUID}","uuid":"u3"}}"#
        ),
        format!(
            r#"{{"type":"assistant","message":{{"role":"assistant","content":[{{"type":"text","text":"The null check is missing; fixed."}}],"usage":{{"input_tokens":1100,"output_tokens":80,"cache_creation_input_tokens":0,"cache_read_input_tokens":900}}}},"timestamp":"2026-01-15T10:01:30Z","sessionId":"{SESSION_UUID}","uuid":"u4"}}"#
        ),
    ]
    .join("\n")
}

/// A Codex rollout transcript: meta, user message, free-standing tool call
/// and output, assistant message, then a cumulative token snapshot.
pub fn sample_codex_transcript() -> String {
    [
        format!(
            r#"{{"timestamp":"2026-02-01T08:00:00Z","type":"session_meta","payload":{{"id":"{SESSION_UUID}","cwd":"/work/codex-proj","timestamp":"2026-02-01T08:00:00Z"}}}}"#
        ),
        r#"{"timestamp":"2026-02-01T08:00:10Z","type":"response_item","payload":{"type":"message","role":"user","content":[{"type":"input_text","text":"list the source files"}]}}"#.to_string(),
        r#"{"timestamp":"2026-02-01T08:00:20Z","type":"response_item","payload":{"type":"message","role":"assistant","content":[{"type":"output_text","text":"Listing them now."}]}}"#.to_string(),
        r#"{"timestamp":"2026-02-01T08:00:21Z","type":"response_item","payload":{"type":"function_call","call_id":"c1","name":"shell","arguments":"{\"command\":[\"ls\",\"src\"]}"}}"#.to_string(),
        r#"{"timestamp":"2026-02-01T08:00:22Z","type":"response_item","payload":{"type":"function_call_output","call_id":"c1","output":"lib.rs\nmain.rs"}}"#.to_string(),
        r#"{"timestamp":"2026-02-01T08:01:30Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"input_tokens":4000,"cached_input_tokens":1500,"output_tokens":600}}}}"#.to_string(),
    ]
    .join("\n")
}

/// An OpenClaw agent transcript with part-list content.
pub fn sample_openclaw_transcript() -> String {
    [
        r#"{"type":"session","timestamp":"2026-03-10T12:00:00Z"}"#,
        r#"{"type":"message","timestamp":"2026-03-10T12:00:05Z","message":{"role":"user","content":[{"type":"text","text":"add tests for the parser"}]}}"#,
        r#"{"type":"message","timestamp":"2026-03-10T12:00:20Z","message":{"role":"assistant","content":[{"type":"text","text":"Adding them."},{"type":"toolCall","id":"tc-1","name":"write_file","arguments":{"path":"tests/parser.rs"}}],"usage":{"input_tokens":700,"output_tokens":90}}}"#,
    ]
    .join("\n")
}

/// Builder for fake on-disk session trees covering all three producers.
pub struct HistoryTreeBuilder {
    temp_dir: TempDir,
}

impl HistoryTreeBuilder {
    /// Create a new builder rooted at an empty fake home directory.
    pub fn new() -> Self {
        Self { temp_dir: TempDir::new().expect("Failed to create temp dir") }
    }

    /// The fake home directory (set `HOME` to this in CLI tests).
    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a Claude Code session under `projects/<encoded>/<uuid>.jsonl`.
    pub fn with_claude_session(self, encoded_project: &str, session_id: &str, content: &str) -> Self {
        let project_dir = self.home().join(".claude").join("projects").join(encoded_project);
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        fs::write(project_dir.join(format!("{session_id}.jsonl")), content)
            .expect("Failed to write transcript");
        self
    }

    /// Add a Codex rollout under `sessions/<y>/<m>/<d>/rollout-...jsonl`.
    pub fn with_codex_session(self, session_id: &str, content: &str) -> Self {
        let day_dir =
            self.home().join(".codex").join("sessions").join("2026").join("02").join("01");
        fs::create_dir_all(&day_dir).expect("Failed to create sessions dir");
        fs::write(
            day_dir.join(format!("rollout-2026-02-01T08-00-00-{session_id}.jsonl")),
            content,
        )
        .expect("Failed to write transcript");
        self
    }

    /// Add an OpenClaw session under `agents/<agent>/sessions/<id>.jsonl`.
    pub fn with_openclaw_session(self, agent: &str, session_id: &str, content: &str) -> Self {
        let sessions_dir = self.home().join(".openclaw").join("agents").join(agent).join("sessions");
        fs::create_dir_all(&sessions_dir).expect("Failed to create sessions dir");
        fs::write(sessions_dir.join(format!("{session_id}.jsonl")), content)
            .expect("Failed to write transcript");
        self
    }

    /// Write a standalone transcript file and return its path.
    pub fn with_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Build and return the temp directory (consumes self)
    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for HistoryTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
