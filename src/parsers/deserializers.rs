use chrono::{DateTime, Utc};
use serde_json::Value;

/// Parse a timestamp value that is either an RFC3339 string (a trailing
/// literal `Z` denotes UTC) or a Unix timestamp in milliseconds.
///
/// Returns `None` on any parse failure; a single bad timestamp degrades to
/// "absent", it never fails the line.
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Parse an RFC3339 timestamp string, normalizing a trailing `Z` to UTC.
pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok()
}

/// Fetch a string field off a loosely-typed object, treating every failure
/// mode (missing key, wrong type, non-object) as absent.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Fetch an unsigned integer field, defaulting to zero when absent or
/// mistyped.
pub fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}
