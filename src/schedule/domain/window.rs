//! Time windows and aggregation periods.

use super::ScheduleDomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open occupancy window `[start, start + duration)` of an assignment.
///
/// Durations are whole minutes and strictly positive. Two windows overlap
/// iff each starts before the other ends; windows that merely touch (one
/// ending exactly when the other starts) do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    duration_minutes: i64,
}

impl TimeWindow {
    /// Creates a validated time window.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidDuration`] when
    /// `duration_minutes` is zero or negative.
    pub const fn new(
        start: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<Self, ScheduleDomainError> {
        if duration_minutes <= 0 {
            return Err(ScheduleDomainError::InvalidDuration(duration_minutes));
        }
        Ok(Self {
            start,
            duration_minutes,
        })
    }

    /// Returns the window start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the duration in whole minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }

    /// Returns the exclusive window end.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration_minutes)
    }

    /// Returns `true` when the two half-open windows share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Half-open aggregation period `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    /// Creates a validated period.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidTimeWindow`] when `start` does
    /// not precede `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ScheduleDomainError> {
        if end <= start {
            return Err(ScheduleDomainError::InvalidTimeWindow);
        }
        Ok(Self { start, end })
    }

    /// Returns the period start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive period end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` when the window shares any instant with the period.
    #[must_use]
    pub fn intersects(&self, window: &TimeWindow) -> bool {
        self.start < window.end() && window.start() < self.end
    }
}
