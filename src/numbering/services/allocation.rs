//! Service layer for phone-number allocation.
//!
//! Provides [`NumberAllocationService`] which coordinates pool imports,
//! availability listings, and the one-number-per-tenant assignment flow.

use crate::numbering::{
    domain::{NumberingDomainError, PhoneNumber, PoolNumber, TenantId},
    ports::{NumberPoolError, NumberPoolRepository},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for assigning a number to a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignNumberRequest {
    tenant_id: TenantId,
    requested_number: Option<String>,
}

impl AssignNumberRequest {
    /// Creates a request that lets the allocator pick the oldest available
    /// number.
    #[must_use]
    pub const fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            requested_number: None,
        }
    }

    /// Requests one specific number instead of the allocator's pick.
    #[must_use]
    pub fn with_requested_number(mut self, number: impl Into<String>) -> Self {
        self.requested_number = Some(number.into());
        self
    }
}

/// Service-level errors for number allocation.
///
/// Every variant is an expected, recoverable-by-caller condition; the
/// service never retries on the caller's behalf.
#[derive(Debug, Error)]
pub enum NumberAllocationError {
    /// The tenant already holds a number; surface it instead of retrying.
    #[error("tenant {tenant_id} already holds number {number}")]
    AlreadyAssigned {
        /// The tenant that attempted the assignment.
        tenant_id: TenantId,
        /// The number the tenant currently holds.
        number: PhoneNumber,
    },

    /// The requested number is not free; a retry without a specific number
    /// falls through to the next available one.
    #[error("phone number {0} is not available")]
    NumberUnavailable(PhoneNumber),

    /// No available numbers remain; an operator has to import more.
    #[error("phone number pool is exhausted")]
    PoolExhausted,

    /// No tenant record exists for the identifier.
    #[error("unknown tenant: {0}")]
    UnknownTenant(TenantId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] NumberingDomainError),

    /// Persistence-layer failure, propagated unchanged.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl From<NumberPoolError> for NumberAllocationError {
    fn from(err: NumberPoolError) -> Self {
        match err {
            NumberPoolError::AlreadyAssigned { tenant_id, number } => {
                Self::AlreadyAssigned { tenant_id, number }
            }
            NumberPoolError::NumberUnavailable(number) => Self::NumberUnavailable(number),
            NumberPoolError::UnknownTenant(tenant_id) => Self::UnknownTenant(tenant_id),
            NumberPoolError::Persistence(source) => Self::Persistence(source),
        }
    }
}

/// Result type for number allocation service operations.
pub type NumberAllocationResult<T> = Result<T, NumberAllocationError>;

/// Phone-number allocation orchestration service.
pub struct NumberAllocationService<R, C>
where
    R: NumberPoolRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for NumberAllocationService<R, C>
where
    R: NumberPoolRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> NumberAllocationService<R, C>
where
    R: NumberPoolRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new allocation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Validates and bulk-loads numbers into the pool.
    ///
    /// # Errors
    ///
    /// Returns [`NumberAllocationError::Domain`] when a number is not valid
    /// E.164, or a repository error when the store rejects the import.
    pub async fn import_numbers(
        &self,
        raw_numbers: Vec<String>,
    ) -> NumberAllocationResult<Vec<PoolNumber>> {
        let entries = raw_numbers
            .into_iter()
            .map(|raw| {
                let number = PhoneNumber::new(raw)?;
                Ok(PoolNumber::new_available(number, &*self.clock))
            })
            .collect::<Result<Vec<_>, NumberingDomainError>>()?;

        self.repository.import(&entries).await?;
        Ok(entries)
    }

    /// Returns all available numbers, oldest pool entry first.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn list_available(&self) -> NumberAllocationResult<Vec<PoolNumber>> {
        Ok(self.repository.list_available().await?)
    }

    /// Returns the number currently held by the tenant, if any.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn current(&self, tenant_id: TenantId) -> NumberAllocationResult<Option<PoolNumber>> {
        Ok(self.repository.find_by_tenant(tenant_id).await?)
    }

    /// Assigns a number to a tenant.
    ///
    /// With a requested number, exactly that number is claimed or the call
    /// fails. Without one, the allocator walks the available numbers oldest
    /// first; losing a claim race to another caller moves on to the next
    /// candidate rather than failing the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`NumberAllocationError::AlreadyAssigned`] when the tenant
    /// holds a number, [`NumberAllocationError::NumberUnavailable`] when a
    /// requested number cannot be claimed,
    /// [`NumberAllocationError::PoolExhausted`] when no number is left, and
    /// [`NumberAllocationError::Domain`] when a requested number fails
    /// validation.
    pub async fn assign(&self, request: AssignNumberRequest) -> NumberAllocationResult<PoolNumber> {
        let AssignNumberRequest {
            tenant_id,
            requested_number,
        } = request;

        // Checked before touching the pool so a held tenant cannot consume
        // capacity.
        if let Some(held) = self.repository.find_by_tenant(tenant_id).await? {
            return Err(NumberAllocationError::AlreadyAssigned {
                tenant_id,
                number: held.number().clone(),
            });
        }

        match requested_number {
            Some(raw) => {
                let number = PhoneNumber::new(raw)?;
                let claimed = self
                    .repository
                    .claim(&number, tenant_id, self.clock.utc())
                    .await?;
                tracing::debug!(tenant = %tenant_id, number = %claimed.number(), "number assigned");
                Ok(claimed)
            }
            None => self.assign_oldest_available(tenant_id).await,
        }
    }

    /// Administrative reset releasing every assigned number.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the reset fails.
    pub async fn reset_pool(&self) -> NumberAllocationResult<usize> {
        let released = self.repository.reset_pool().await?;
        tracing::info!(released, "phone-number pool reset");
        Ok(released)
    }

    async fn assign_oldest_available(
        &self,
        tenant_id: TenantId,
    ) -> NumberAllocationResult<PoolNumber> {
        let candidates = self.repository.list_available().await?;
        if candidates.is_empty() {
            return Err(NumberAllocationError::PoolExhausted);
        }

        for candidate in candidates {
            match self
                .repository
                .claim(candidate.number(), tenant_id, self.clock.utc())
                .await
            {
                Ok(claimed) => {
                    tracing::debug!(
                        tenant = %tenant_id,
                        number = %claimed.number(),
                        "number assigned"
                    );
                    return Ok(claimed);
                }
                // Raced by another caller; the next candidate is still fair
                // game.
                Err(NumberPoolError::NumberUnavailable(number)) => {
                    tracing::debug!(tenant = %tenant_id, number = %number, "claim race lost");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(NumberAllocationError::PoolExhausted)
    }
}
