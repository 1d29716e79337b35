//! Timestamp utilities
//!
//! All persisted timestamps are RFC 3339 UTC strings so they sort
//! lexicographically in SQLite.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time formatted for storage
pub fn now_rfc3339() -> String {
    to_rfc3339(now())
}

/// Format a timestamp for storage (second precision, `Z` suffix)
pub fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Stored timestamp `minutes` from now
pub fn minutes_from_now(minutes: i64) -> String {
    to_rfc3339(now() + Duration::minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_rfc3339_uses_z_suffix() {
        let formatted = now_rfc3339();
        assert!(formatted.ends_with('Z'), "got {}", formatted);
        assert!(parse_rfc3339(&formatted).is_some());
    }

    #[test]
    fn test_minutes_from_now_is_in_future() {
        let later = parse_rfc3339(&minutes_from_now(30)).unwrap();
        assert!(later > now());

        let earlier = parse_rfc3339(&minutes_from_now(-30)).unwrap();
        assert!(earlier < now());
    }

    #[test]
    fn test_stored_timestamps_sort_lexicographically() {
        let a = to_rfc3339(now());
        let b = minutes_from_now(1);
        assert!(a < b);
    }
}
