//! AI Session Exporter - Convert coding-assistant transcripts to HTML
//!
//! This library turns the append-only JSONL session logs written by several
//! AI coding tools (Claude Code, Codex CLI, OpenClaw) into self-contained,
//! themeable HTML reports and Markdown companions. It supports:
//!
//! - Decoding and classifying three distinct producer schemas behind one
//!   canonical event shape
//! - Reconstructing turn-structured conversations with tool invocations
//!   matched to their results
//! - Aggregating token usage, tool counts and session duration
//! - Mining a short summary label from the opening user turns
//! - Discovering sessions on disk and batch-exporting them in parallel
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ai_session_exporter::config::ExportConfig;
//! use ai_session_exporter::export::parse_transcript;
//! use ai_session_exporter::parsers::detect_format;
//!
//! let path = Path::new("/Users/alice/.claude/projects/-work-demo/abc.jsonl");
//! let config = ExportConfig::default();
//! let format = detect_format(path)?;
//! let session = parse_transcript(path, format, &config)?;
//! println!("{} turns reconstructed", session.turns.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod parsers;
pub mod reconstruct;
pub mod render;
pub mod stats;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use config::ExportConfig;
pub use export::{export_session, parse_transcript};
pub use models::{Role, Session, SessionStats, ToolCall, Turn};
pub use summary::generate_summary;
pub use utils::paths::{decode_project_dir, format_path_with_tilde};
