//! Error types for schedule domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain schedule values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleDomainError {
    /// The duration is zero or negative.
    #[error("invalid duration {0} minutes, expected a positive value")]
    InvalidDuration(i64),

    /// The aggregation period does not start before it ends.
    #[error("invalid time window: start must precede end")]
    InvalidTimeWindow,

    /// The initial status is not a valid entry state.
    #[error("invalid initial status '{0}', expected pending or scheduled")]
    InvalidInitialStatus(String),

    /// The status transition is not permitted by the lifecycle.
    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// The assignment has no attached worker.
    #[error("assignment has no attached worker")]
    NoWorkerAttached,
}

/// Error returned while parsing assignment statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown assignment status: {0}")]
pub struct ParseAssignmentStatusError(pub String);
