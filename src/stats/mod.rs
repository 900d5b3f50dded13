//! Statistics aggregation: a second, independent fold over the same event
//! stream the reconstructor consumes.
//!
//! Token events carry their semantics tag from the classifier: per-message
//! deltas are summed, running-total snapshots replace the totals so the
//! latest snapshot wins. Turn counts by role are taken from the
//! reconstructed turn sequence so they respect turn merging and the
//! drop-empty-turn invariant.

use std::collections::HashMap;

use crate::models::{Event, EventKind, Role, SessionStats, TokenUsage, Turn};

/// Fold state for session statistics.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    tool_counts: HashMap<String, u64>,
    tokens: TokenUsage,
    first_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    last_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the counters. Never fails.
    pub fn observe(&mut self, event: &Event) {
        if let Some(ts) = event.timestamp {
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(ts);
            }
            self.last_timestamp = Some(ts);
        }

        match &event.kind {
            EventKind::ToolInvocation { name, .. } => {
                *self.tool_counts.entry(name.clone()).or_insert(0) += 1;
            }
            EventKind::TokenUsage { usage, semantics } => match semantics {
                crate::models::TokenSemantics::Delta => self.tokens.add(usage),
                crate::models::TokenSemantics::Snapshot => self.tokens = usage.clone(),
            },
            _ => {}
        }
    }

    /// Close the fold, filling turn counts from the reconstructed turns.
    pub fn finish(self, turns: &[Turn]) -> SessionStats {
        let user_turns = turns.iter().filter(|t| t.role == Role::User).count();
        let assistant_turns = turns.iter().filter(|t| t.role == Role::Assistant).count();

        SessionStats {
            user_turns,
            assistant_turns,
            tool_counts: self.tool_counts,
            tokens: self.tokens,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{TokenSemantics, ToolInput};

    fn usage_event(input: u64, output: u64, semantics: TokenSemantics) -> Event {
        Event::new(
            EventKind::TokenUsage {
                usage: TokenUsage { input_tokens: input, output_tokens: output, ..Default::default() },
                semantics,
            },
            None,
        )
    }

    fn invocation_event(name: &str) -> Event {
        Event::new(
            EventKind::ToolInvocation {
                call_id: None,
                name: name.to_string(),
                input: ToolInput::Command(String::new()),
            },
            None,
        )
    }

    #[test]
    fn test_delta_usage_accumulates() {
        let mut agg = StatsAggregator::new();
        agg.observe(&usage_event(100, 20, TokenSemantics::Delta));
        agg.observe(&usage_event(50, 5, TokenSemantics::Delta));

        let stats = agg.finish(&[]);
        assert_eq!(stats.tokens.input_tokens, 150);
        assert_eq!(stats.tokens.output_tokens, 25);
    }

    #[test]
    fn test_snapshot_usage_latest_wins() {
        let mut agg = StatsAggregator::new();
        agg.observe(&usage_event(100, 20, TokenSemantics::Snapshot));
        agg.observe(&usage_event(350, 90, TokenSemantics::Snapshot));

        let stats = agg.finish(&[]);
        assert_eq!(stats.tokens.input_tokens, 350);
        assert_eq!(stats.tokens.output_tokens, 90);
    }

    #[test]
    fn test_tool_counts_by_name() {
        let mut agg = StatsAggregator::new();
        agg.observe(&invocation_event("Bash"));
        agg.observe(&invocation_event("Read"));
        agg.observe(&invocation_event("Bash"));

        let stats = agg.finish(&[]);
        assert_eq!(stats.tool_counts["Bash"], 2);
        assert_eq!(stats.tool_counts["Read"], 1);
        assert_eq!(stats.total_tool_calls(), 3);
    }

    #[test]
    fn test_first_and_last_timestamps_tracked() {
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 2, 1, 8, 1, 30).unwrap();

        let mut agg = StatsAggregator::new();
        agg.observe(&Event::new(EventKind::UserText { text: "hi".to_string() }, Some(t0)));
        agg.observe(&Event::new(EventKind::AssistantText { text: "yo".to_string() }, None));
        agg.observe(&Event::new(EventKind::AssistantText { text: "done".to_string() }, Some(t1)));

        let stats = agg.finish(&[]);
        assert_eq!(stats.first_timestamp, Some(t0));
        assert_eq!(stats.last_timestamp, Some(t1));
        assert_eq!(stats.duration_seconds(), Some(90.0));
    }

    #[test]
    fn test_turn_counts_come_from_reconstructed_turns() {
        let turns = vec![
            Turn::new(Role::User, "q", None),
            Turn::new(Role::Assistant, "a", None),
            Turn::new(Role::Assistant, "b", None),
        ];
        let stats = StatsAggregator::new().finish(&turns);

        assert_eq!(stats.user_turns, 1);
        assert_eq!(stats.assistant_turns, 2);
        assert_eq!(stats.total_turns(), 3);
    }
}
