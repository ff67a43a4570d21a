//! Error types for numbering domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain numbering values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NumberingDomainError {
    /// The phone number is not a valid E.164 string.
    #[error("invalid phone number '{0}', expected E.164 format")]
    InvalidPhoneNumber(String),

    /// The number is not available for assignment.
    #[error("phone number {0} is not available")]
    NumberNotAvailable(String),

    /// A persisted pool record pairs a status with inconsistent fields.
    #[error("corrupt pool record for {number}: status '{status}' with tenant set: {tenant_set}")]
    CorruptPoolRecord {
        /// The number of the corrupt record.
        number: String,
        /// The persisted status string.
        status: String,
        /// Whether an assigned tenant was present.
        tenant_set: bool,
    },
}

/// Error returned while parsing number statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown number status: {0}")]
pub struct ParseNumberStatusError(pub String);
