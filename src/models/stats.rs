use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Token counts in the four categories producers report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenUsage {
    /// Input plus output tokens, the figure shown in quick stats.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
    }
}

/// Counters accumulated over one session's event stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub user_turns: usize,
    pub assistant_turns: usize,
    /// Invocation count per tool name; iteration order is irrelevant here,
    /// ordered views come from [`SessionStats::top_tools`].
    pub tool_counts: HashMap<String, u64>,
    pub tokens: TokenUsage,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl SessionStats {
    /// Wall-clock span of the session in seconds.
    ///
    /// `None` (not zero) when fewer than two timestamps parsed.
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => {
                Some((last - first).num_milliseconds() as f64 / 1000.0)
            }
            _ => None,
        }
    }

    pub fn total_tool_calls(&self) -> u64 {
        self.tool_counts.values().sum()
    }

    pub fn total_turns(&self) -> usize {
        self.user_turns + self.assistant_turns
    }

    /// The `n` most used tools, ordered by count descending with name as
    /// the tie-break so output is deterministic.
    pub fn top_tools(&self, n: usize) -> Vec<(&str, u64)> {
        let mut tools: Vec<(&str, u64)> =
            self.tool_counts.iter().map(|(name, count)| (name.as_str(), *count)).collect();
        tools.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tools.truncate(n);
        tools
    }
}
