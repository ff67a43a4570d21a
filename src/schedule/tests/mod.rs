//! Unit tests for the schedule context.


use chrono::{DateTime, TimeZone, Utc};

/// Timestamp within the fixed test week (Monday 2025-01-06).
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}
