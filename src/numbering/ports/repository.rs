//! Repository port for the shared phone-number pool.

use crate::numbering::domain::{PhoneNumber, PoolNumber, TenantId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for number-pool repository operations.
pub type NumberPoolResult<T> = Result<T, NumberPoolError>;

/// Phone-number pool persistence contract.
///
/// The pool and the tenant assignment column are the single source of truth
/// for allocation state; implementations must not cache either across calls.
#[async_trait]
pub trait NumberPoolRepository: Send + Sync {
    /// Bulk-loads imported numbers into the pool.
    ///
    /// # Errors
    ///
    /// Returns [`NumberPoolError::Persistence`] when a number already exists
    /// in the pool or the store rejects the write.
    async fn import(&self, numbers: &[PoolNumber]) -> NumberPoolResult<()>;

    /// Returns all available numbers, oldest pool entry first.
    ///
    /// Entries sharing a pool-entry timestamp are ordered by number so the
    /// listing is deterministic.
    async fn list_available(&self) -> NumberPoolResult<Vec<PoolNumber>>;

    /// Finds a pool entry by phone number.
    ///
    /// Returns `None` when the number was never imported.
    async fn find_by_number(&self, number: &PhoneNumber) -> NumberPoolResult<Option<PoolNumber>>;

    /// Finds the pool entry held by the given tenant.
    ///
    /// Returns `None` when the tenant holds no number.
    async fn find_by_tenant(&self, tenant_id: TenantId) -> NumberPoolResult<Option<PoolNumber>>;

    /// Claims a specific number for a tenant.
    ///
    /// The claim is a single conditional state transition executed together
    /// with the tenant-side assignment in one transaction: the number flips
    /// from `Available` to `Assigned` only if it is still `Available` at the
    /// moment of the write, and the tenant's assignment column is set in the
    /// same unit of work. Concurrent claims for one number resolve to
    /// exactly one winner; every loser observes
    /// [`NumberPoolError::NumberUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`NumberPoolError::NumberUnavailable`] when the number is
    /// missing from the pool or no longer available (the two cases are
    /// deliberately indistinguishable), [`NumberPoolError::AlreadyAssigned`]
    /// when the tenant already holds a number, and
    /// [`NumberPoolError::UnknownTenant`] when no tenant record exists.
    async fn claim(
        &self,
        number: &PhoneNumber,
        tenant_id: TenantId,
        at: DateTime<Utc>,
    ) -> NumberPoolResult<PoolNumber>;

    /// Administrative reset releasing every assigned number.
    ///
    /// Clears the tenant assignment columns and returns the numbers to the
    /// pool in one transaction. Returns the count of released numbers.
    ///
    /// # Errors
    ///
    /// Returns [`NumberPoolError::Persistence`] when the store rejects the
    /// writes.
    async fn reset_pool(&self) -> NumberPoolResult<usize>;
}

/// Errors returned by number-pool repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NumberPoolError {
    /// The tenant already holds a number.
    #[error("tenant {tenant_id} already holds number {number}")]
    AlreadyAssigned {
        /// The tenant that attempted the claim.
        tenant_id: TenantId,
        /// The number the tenant currently holds.
        number: PhoneNumber,
    },

    /// The requested number is missing from the pool or already claimed.
    #[error("phone number {0} is not available")]
    NumberUnavailable(PhoneNumber),

    /// No tenant record exists for the identifier.
    #[error("unknown tenant: {0}")]
    UnknownTenant(TenantId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NumberPoolError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for NumberPoolError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
