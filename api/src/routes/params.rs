use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Raw query string pairs in request order. A repeated key resolves to its first value.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The first value for `key`, with an empty value counted as missing.
    pub fn required(&self, key: &str) -> Option<String> {
        non_empty(self.first(key).map(str::to_string))
    }
}

/// Reads an optional `limit` query value. Missing, unparsable (surrounding whitespace included)
/// and non-positive values fall back to `default`; anything above `max` is clamped.
pub fn parse_limit(raw: Option<&str>, default: i64, max: i64) -> i64 {
    match raw.and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n > 0 => n.min(max),
        _ => default,
    }
}

/// Treats an empty value the same as a missing one.
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.is_empty())
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
