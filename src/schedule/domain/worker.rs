//! Worker read model used by scheduling and aggregation.

use super::WorkerId;
use serde::{Deserialize, Serialize};

/// Worker record restricted to the fields this core reads.
///
/// `expected_weekly_hours` is a display target, not an invariant; nothing
/// in the scheduler enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    id: WorkerId,
    expected_weekly_hours: Option<u32>,
}

impl Worker {
    /// Creates a worker read model.
    #[must_use]
    pub const fn new(id: WorkerId, expected_weekly_hours: Option<u32>) -> Self {
        Self {
            id,
            expected_weekly_hours,
        }
    }

    /// Returns the worker identifier.
    #[must_use]
    pub const fn id(&self) -> WorkerId {
        self.id
    }

    /// Returns the weekly-hours display target, if configured.
    #[must_use]
    pub const fn expected_weekly_hours(&self) -> Option<u32> {
        self.expected_weekly_hours
    }
}
