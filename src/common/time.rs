use chrono::{DateTime, Utc};

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts an epoch-millisecond stamp back to a DateTime<Utc>.
///
/// Returns None for stamps outside the representable chrono range.
pub fn to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
