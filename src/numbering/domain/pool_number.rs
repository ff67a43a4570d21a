//! Pool-number aggregate and its assignment lifecycle.

use super::{NumberingDomainError, ParseNumberStatusError, PhoneNumber, TenantId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Assignment status of a pooled phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStatus {
    /// The number sits in the pool and can be claimed.
    Available,
    /// The number is permanently held by a tenant.
    Assigned,
}

impl NumberStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
        }
    }
}

impl TryFrom<&str> for NumberStatus {
    type Error = ParseNumberStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            _ => Err(ParseNumberStatusError(value.to_owned())),
        }
    }
}

/// Pool-number aggregate root.
///
/// A number enters the pool as `Available` and transitions to `Assigned`
/// exactly once. The assigned tenant and assignment timestamp are set iff
/// the status is `Assigned`; [`Self::from_persisted`] rejects records that
/// break this pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolNumber {
    number: PhoneNumber,
    status: NumberStatus,
    assigned_tenant_id: Option<TenantId>,
    assigned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted pool number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPoolNumberData {
    /// Persisted phone number.
    pub number: PhoneNumber,
    /// Persisted assignment status.
    pub status: NumberStatus,
    /// Persisted holding tenant, if any.
    pub assigned_tenant_id: Option<TenantId>,
    /// Persisted assignment timestamp, if any.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Persisted pool-entry timestamp.
    pub created_at: DateTime<Utc>,
}

impl PoolNumber {
    /// Creates a fresh available pool entry for an imported number.
    #[must_use]
    pub fn new_available(number: PhoneNumber, clock: &impl Clock) -> Self {
        Self {
            number,
            status: NumberStatus::Available,
            assigned_tenant_id: None,
            assigned_at: None,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a pool number from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`NumberingDomainError::CorruptPoolRecord`] when the status
    /// and the nullable assignment fields disagree.
    pub fn from_persisted(data: PersistedPoolNumberData) -> Result<Self, NumberingDomainError> {
        let fields_consistent = match data.status {
            NumberStatus::Available => {
                data.assigned_tenant_id.is_none() && data.assigned_at.is_none()
            }
            NumberStatus::Assigned => {
                data.assigned_tenant_id.is_some() && data.assigned_at.is_some()
            }
        };
        if !fields_consistent {
            return Err(NumberingDomainError::CorruptPoolRecord {
                number: data.number.to_string(),
                status: data.status.as_str().to_owned(),
                tenant_set: data.assigned_tenant_id.is_some(),
            });
        }

        Ok(Self {
            number: data.number,
            status: data.status,
            assigned_tenant_id: data.assigned_tenant_id,
            assigned_at: data.assigned_at,
            created_at: data.created_at,
        })
    }

    /// Returns the phone number.
    #[must_use]
    pub const fn number(&self) -> &PhoneNumber {
        &self.number
    }

    /// Returns the assignment status.
    #[must_use]
    pub const fn status(&self) -> NumberStatus {
        self.status
    }

    /// Returns the holding tenant, if any.
    #[must_use]
    pub const fn assigned_tenant_id(&self) -> Option<TenantId> {
        self.assigned_tenant_id
    }

    /// Returns the assignment timestamp, if any.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns the pool-entry timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the number can still be claimed.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, NumberStatus::Available)
    }

    /// Produces the assigned successor of an available number.
    ///
    /// # Errors
    ///
    /// Returns [`NumberingDomainError::NumberNotAvailable`] when the number
    /// has already been claimed.
    pub fn assigned_to(
        &self,
        tenant_id: TenantId,
        at: DateTime<Utc>,
    ) -> Result<Self, NumberingDomainError> {
        if !self.is_available() {
            return Err(NumberingDomainError::NumberNotAvailable(
                self.number.to_string(),
            ));
        }

        Ok(Self {
            number: self.number.clone(),
            status: NumberStatus::Assigned,
            assigned_tenant_id: Some(tenant_id),
            assigned_at: Some(at),
            created_at: self.created_at,
        })
    }

    /// Produces the released successor of a number, used only by the
    /// administrative pool reset.
    #[must_use]
    pub fn released(&self) -> Self {
        Self {
            number: self.number.clone(),
            status: NumberStatus::Available,
            assigned_tenant_id: None,
            assigned_at: None,
            created_at: self.created_at,
        }
    }
}
