//! Nanosecond timestamps for order and trade sequencing

use chrono::Utc;

/// Current wall-clock time as integer nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
