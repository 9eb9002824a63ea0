use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical display format for persisted timestamps.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for comments and posts with no text body.
pub const NO_TEXT_PLACEHOLDER: &str = "[No text]";

/// Placeholder for records with no resolvable author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A normalized comment as persisted in the incremental table.
/// `id` values are unique across the entire table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub name: String,
    pub time: String,
    pub message: String,
}

/// Parse an API timestamp (ISO-8601 with offset, e.g.
/// `2024-05-01T10:00:00+0000`) into the canonical UTC display format.
/// Returns `None` for unparseable input, rendered downstream as an empty
/// cell.
pub fn normalize_display_time(raw: &str) -> Option<String> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc).format(DISPLAY_TIME_FORMAT).to_string())
}

/// Parse a stored state timestamp back into a UTC instant. Accepts both the
/// canonical display format (written by the sink, assumed UTC) and ISO-8601
/// with offset, so state files from either era load cleanly.
pub fn parse_state_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, DISPLAY_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn display_time_from_offset_timestamp() {
        assert_eq!(
            normalize_display_time("2024-05-01T10:30:00+0000").as_deref(),
            Some("2024-05-01 10:30:00")
        );
        // Offset is folded into UTC, not discarded.
        assert_eq!(
            normalize_display_time("2024-05-01T10:30:00+0200").as_deref(),
            Some("2024-05-01 08:30:00")
        );
    }

    #[test]
    fn display_time_accepts_colon_offsets() {
        assert_eq!(
            normalize_display_time("2024-05-01T10:30:00+02:00").as_deref(),
            Some("2024-05-01 08:30:00")
        );
    }

    #[test]
    fn unparseable_time_is_none() {
        assert!(normalize_display_time("not a timestamp").is_none());
        assert!(normalize_display_time("").is_none());
        // Date-only input lacks the offset the API always sends.
        assert!(normalize_display_time("2024-05-01").is_none());
    }

    #[test]
    fn state_time_roundtrips_display_format() {
        let parsed = parse_state_time("2024-05-01 10:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn state_time_accepts_iso_with_offset() {
        let parsed = parse_state_time("2024-05-01T10:30:00+0200").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn state_time_rejects_garbage() {
        assert!(parse_state_time("yesterday").is_none());
    }
}
