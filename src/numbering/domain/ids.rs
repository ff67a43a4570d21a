//! Identifier and validated scalar types for the numbering domain.

use super::NumberingDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a tenant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a new random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TenantId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated E.164 phone number.
///
/// The canonical form is a leading `+` followed by 8 to 15 digits with a
/// non-zero first digit, matching what the telephony provider accepts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 8;
    const MAX_DIGITS: usize = 15;

    /// Creates a validated phone number.
    ///
    /// # Errors
    ///
    /// Returns [`NumberingDomainError::InvalidPhoneNumber`] when the value
    /// is not a `+`-prefixed E.164 digit string.
    pub fn new(value: impl Into<String>) -> Result<Self, NumberingDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        let Some(digits) = normalized.strip_prefix('+') else {
            return Err(NumberingDomainError::InvalidPhoneNumber(raw));
        };
        let digit_count = digits.chars().count();
        let is_valid = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digit_count)
            && digits.chars().all(|ch| ch.is_ascii_digit())
            && !digits.starts_with('0');

        if !is_valid {
            return Err(NumberingDomainError::InvalidPhoneNumber(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
