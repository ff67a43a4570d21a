//! In-memory number pool for development and allocation tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::numbering::{
    domain::{PhoneNumber, PoolNumber, TenantId},
    ports::{NumberPoolError, NumberPoolRepository, NumberPoolResult},
};

/// Thread-safe in-memory number pool.
///
/// A single write lock covers both the pool and the tenant assignments, so
/// the claim step observes the same atomicity as the transactional database
/// adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNumberPool {
    state: Arc<RwLock<InMemoryPoolState>>,
}

#[derive(Debug, Default)]
struct InMemoryPoolState {
    numbers: HashMap<PhoneNumber, PoolNumber>,
    tenants: HashMap<TenantId, Option<PhoneNumber>>,
}

impl InMemoryNumberPool {
    /// Creates an empty in-memory pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tenant record.
    ///
    /// Tenant creation belongs to the CRUD layer outside this crate; tests
    /// and development setups seed tenants through this method instead.
    ///
    /// # Errors
    ///
    /// Returns [`NumberPoolError::Persistence`] when the state lock is
    /// poisoned.
    pub fn register_tenant(&self, tenant_id: TenantId) -> NumberPoolResult<()> {
        let mut state = write_state(&self.state)?;
        state.tenants.entry(tenant_id).or_insert(None);
        Ok(())
    }
}

fn write_state(
    state: &Arc<RwLock<InMemoryPoolState>>,
) -> NumberPoolResult<std::sync::RwLockWriteGuard<'_, InMemoryPoolState>> {
    state
        .write()
        .map_err(|err| NumberPoolError::persistence(std::io::Error::other(err.to_string())))
}

fn read_state(
    state: &Arc<RwLock<InMemoryPoolState>>,
) -> NumberPoolResult<std::sync::RwLockReadGuard<'_, InMemoryPoolState>> {
    state
        .read()
        .map_err(|err| NumberPoolError::persistence(std::io::Error::other(err.to_string())))
}

#[async_trait]
impl NumberPoolRepository for InMemoryNumberPool {
    async fn import(&self, numbers: &[PoolNumber]) -> NumberPoolResult<()> {
        let mut state = write_state(&self.state)?;
        for entry in numbers {
            if state.numbers.contains_key(entry.number()) {
                return Err(NumberPoolError::persistence(std::io::Error::other(
                    format!("number {} already imported", entry.number()),
                )));
            }
        }
        for entry in numbers {
            state.numbers.insert(entry.number().clone(), entry.clone());
        }
        Ok(())
    }

    async fn list_available(&self) -> NumberPoolResult<Vec<PoolNumber>> {
        let state = read_state(&self.state)?;
        let mut available: Vec<PoolNumber> = state
            .numbers
            .values()
            .filter(|entry| entry.is_available())
            .cloned()
            .collect();
        available.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.number().cmp(b.number()))
        });
        Ok(available)
    }

    async fn find_by_number(&self, number: &PhoneNumber) -> NumberPoolResult<Option<PoolNumber>> {
        let state = read_state(&self.state)?;
        Ok(state.numbers.get(number).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: TenantId) -> NumberPoolResult<Option<PoolNumber>> {
        let state = read_state(&self.state)?;
        let held = state
            .tenants
            .get(&tenant_id)
            .and_then(Option::as_ref)
            .and_then(|number| state.numbers.get(number))
            .cloned();
        Ok(held)
    }

    async fn claim(
        &self,
        number: &PhoneNumber,
        tenant_id: TenantId,
        at: DateTime<Utc>,
    ) -> NumberPoolResult<PoolNumber> {
        let mut state = write_state(&self.state)?;

        let Some(held_slot) = state.tenants.get(&tenant_id) else {
            return Err(NumberPoolError::UnknownTenant(tenant_id));
        };
        if let Some(held) = held_slot {
            return Err(NumberPoolError::AlreadyAssigned {
                tenant_id,
                number: held.clone(),
            });
        }

        // The conditional transition: only an entry that is still available
        // at this point can flip to assigned.
        let assigned = match state.numbers.get(number) {
            Some(entry) if entry.is_available() => entry
                .assigned_to(tenant_id, at)
                .map_err(|_| NumberPoolError::NumberUnavailable(number.clone()))?,
            _ => return Err(NumberPoolError::NumberUnavailable(number.clone())),
        };

        state.numbers.insert(number.clone(), assigned.clone());
        state.tenants.insert(tenant_id, Some(number.clone()));
        Ok(assigned)
    }

    async fn reset_pool(&self) -> NumberPoolResult<usize> {
        let mut state = write_state(&self.state)?;
        let assigned: Vec<PhoneNumber> = state
            .numbers
            .values()
            .filter(|entry| !entry.is_available())
            .map(|entry| entry.number().clone())
            .collect();

        for number in &assigned {
            let released = state.numbers.get(number).map(PoolNumber::released);
            if let Some(entry) = released {
                state.numbers.insert(number.clone(), entry);
            }
        }
        for slot in state.tenants.values_mut() {
            *slot = None;
        }
        Ok(assigned.len())
    }
}
