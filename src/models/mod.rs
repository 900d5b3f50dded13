//! Data models for reconstructed conversation sessions.
//!
//! This module defines the structures shared by every producer format:
//!
//! - [`Event`] - One canonical, schema-neutral transcript event
//! - [`Turn`] / [`Session`] - The reconstructed conversation
//! - [`ToolCall`] - A tool invocation with its (optional) captured result
//! - [`SessionStats`] / [`TokenUsage`] - Accumulated session statistics
//!
//! Producer-specific wire shapes live in the `parsers` module; everything
//! downstream of classification (reconstruction, statistics, rendering)
//! operates on these types only.

pub mod event;
pub mod session;
pub mod stats;

pub use event::{Event, EventKind, SessionMetaUpdate, TokenSemantics, ToolInput};
pub use session::{Role, Session, SessionMeta, ToolCall, Turn};
pub use stats::{SessionStats, TokenUsage};
