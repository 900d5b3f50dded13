//! Rendering a reconstructed [`Session`](crate::models::Session) to
//! self-contained HTML and Markdown, plus the small formatting helpers
//! (durations, token counts, timestamps) both renderers share.

pub mod html;
pub mod markdown;
pub mod theme;

use chrono::{DateTime, Utc};

pub use html::render_html;
pub use markdown::render_markdown;

/// Format a duration in seconds as a compact human-readable string.
///
/// `None` renders as "N/A"; sub-minute values as "42s", sub-hour as
/// "1m 30s", larger as "2h 5m".
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds else {
        return "N/A".to_string();
    };
    let total = seconds.max(0.0) as u64;
    if total < 60 {
        format!("{total}s")
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}

/// Format a token count with K/M suffixes for large numbers.
pub fn format_token_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Format a timestamp with a user-supplied strftime string, falling back to
/// ISO date-time when the format string itself is invalid.
pub fn format_datetime(dt: &DateTime<Utc>, fmt: &str) -> String {
    use chrono::format::{Item, StrftimeItems};

    let items: Vec<Item> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    dt.format_with_items(items.into_iter()).to_string()
}

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_duration_90_seconds_is_1m_30s() {
        assert_eq!(format_duration(Some(90.0)), "1m 30s");
    }

    #[test]
    fn test_format_duration_ranges() {
        assert_eq!(format_duration(None), "N/A");
        assert_eq!(format_duration(Some(0.0)), "0s");
        assert_eq!(format_duration(Some(42.7)), "42s");
        assert_eq!(format_duration(Some(3600.0)), "1h 0m");
        assert_eq!(format_duration(Some(7505.0)), "2h 5m");
    }

    #[test]
    fn test_format_token_count() {
        assert_eq!(format_token_count(0), "0");
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(1_000), "1.0K");
        assert_eq!(format_token_count(24_337), "24.3K");
        assert_eq!(format_token_count(1_500_000), "1.5M");
    }

    #[test]
    fn test_format_datetime_with_custom_format() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt, "%H:%M:%S"), "10:30:00");
        assert_eq!(format_datetime(&dt, "%Y-%m-%d"), "2026-01-15");
    }

    #[test]
    fn test_format_datetime_invalid_format_falls_back() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt, "%Q-invalid"), "2026-01-15 10:30:00");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
