//! `PostgreSQL` repository implementation for the phone-number pool.

use super::{
    models::{PhoneNumberRow, row_to_pool_number, to_new_row},
    schema::{phone_numbers, tenants},
};
use crate::numbering::{
    domain::{NumberStatus, PhoneNumber, PoolNumber, TenantId},
    ports::{NumberPoolError, NumberPoolRepository, NumberPoolResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by numbering adapters.
pub type NumberPoolPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed number pool.
///
/// All operations are offloaded to a blocking thread pool via
/// [`tokio::task::spawn_blocking`] so Diesel's synchronous I/O never stalls
/// the async executor. The claim step relies on a conditional `UPDATE`
/// filtered on the current status, so the check and the write are one
/// statement and concurrent claims cannot both succeed.
#[derive(Debug, Clone)]
pub struct PostgresNumberPool {
    pool: NumberPoolPgPool,
}

impl PostgresNumberPool {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: NumberPoolPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> NumberPoolResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NumberPoolResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(NumberPoolError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(NumberPoolError::persistence)?
    }
}

#[async_trait]
impl NumberPoolRepository for PostgresNumberPool {
    async fn import(&self, numbers: &[PoolNumber]) -> NumberPoolResult<()> {
        let rows: Vec<_> = numbers.iter().map(to_new_row).collect();
        self.run_blocking(move |connection| {
            diesel::insert_into(phone_numbers::table)
                .values(&rows)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_available(&self) -> NumberPoolResult<Vec<PoolNumber>> {
        self.run_blocking(move |connection| {
            let rows = phone_numbers::table
                .filter(phone_numbers::status.eq(NumberStatus::Available.as_str()))
                .order((
                    phone_numbers::created_at.asc(),
                    phone_numbers::number.asc(),
                ))
                .select(PhoneNumberRow::as_select())
                .load::<PhoneNumberRow>(connection)?;
            rows.into_iter().map(row_to_pool_number).collect()
        })
        .await
    }

    async fn find_by_number(&self, number: &PhoneNumber) -> NumberPoolResult<Option<PoolNumber>> {
        let lookup = number.to_string();
        self.run_blocking(move |connection| {
            let row = phone_numbers::table
                .filter(phone_numbers::number.eq(&lookup))
                .select(PhoneNumberRow::as_select())
                .first::<PhoneNumberRow>(connection)
                .optional()?;
            row.map(row_to_pool_number).transpose()
        })
        .await
    }

    async fn find_by_tenant(&self, tenant_id: TenantId) -> NumberPoolResult<Option<PoolNumber>> {
        let tenant_uuid = tenant_id.into_inner();
        self.run_blocking(move |connection| {
            let row = phone_numbers::table
                .filter(phone_numbers::assigned_tenant_id.eq(tenant_uuid))
                .select(PhoneNumberRow::as_select())
                .first::<PhoneNumberRow>(connection)
                .optional()?;
            row.map(row_to_pool_number).transpose()
        })
        .await
    }

    async fn claim(
        &self,
        number: &PhoneNumber,
        tenant_id: TenantId,
        at: DateTime<Utc>,
    ) -> NumberPoolResult<PoolNumber> {
        let claim_number = number.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, NumberPoolError, _>(|tx_conn| {
                claim_in_transaction(tx_conn, &claim_number, tenant_id, at)
            })
        })
        .await
    }

    async fn reset_pool(&self) -> NumberPoolResult<usize> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, NumberPoolError, _>(|tx_conn| {
                let released = diesel::update(
                    phone_numbers::table
                        .filter(phone_numbers::status.eq(NumberStatus::Assigned.as_str())),
                )
                .set((
                    phone_numbers::status.eq(NumberStatus::Available.as_str()),
                    phone_numbers::assigned_tenant_id.eq(None::<uuid::Uuid>),
                    phone_numbers::assigned_at.eq(None::<DateTime<Utc>>),
                ))
                .execute(tx_conn)?;

                diesel::update(
                    tenants::table.filter(tenants::assigned_phone_number.is_not_null()),
                )
                .set(tenants::assigned_phone_number.eq(None::<String>))
                .execute(tx_conn)?;

                Ok(released)
            })
        })
        .await
    }
}

/// Claims a number inside an open transaction.
///
/// The number-side update is the compare-and-swap: it flips the row to
/// `Assigned` only when the row still reads `Available`, so losers of a race
/// update zero rows. The tenant-side update is likewise conditional on the
/// assignment column being null, which enforces one number per tenant even
/// when the service-level pre-check was raced past.
fn claim_in_transaction(
    connection: &mut PgConnection,
    number: &PhoneNumber,
    tenant_id: TenantId,
    at: DateTime<Utc>,
) -> NumberPoolResult<PoolNumber> {
    let claimed = diesel::update(
        phone_numbers::table
            .filter(phone_numbers::number.eq(number.as_str()))
            .filter(phone_numbers::status.eq(NumberStatus::Available.as_str())),
    )
    .set((
        phone_numbers::status.eq(NumberStatus::Assigned.as_str()),
        phone_numbers::assigned_tenant_id.eq(tenant_id.into_inner()),
        phone_numbers::assigned_at.eq(at),
    ))
    .execute(connection)?;

    if claimed == 0 {
        // Missing from the pool and already-taken are reported identically.
        return Err(NumberPoolError::NumberUnavailable(number.clone()));
    }

    let tenant_updated = diesel::update(
        tenants::table
            .filter(tenants::id.eq(tenant_id.into_inner()))
            .filter(tenants::assigned_phone_number.is_null()),
    )
    .set((
        tenants::assigned_phone_number.eq(number.as_str()),
        tenants::updated_at.eq(at),
    ))
    .execute(connection)?;

    if tenant_updated == 0 {
        let err = tenant_claim_failure(connection, tenant_id)?;
        tracing::debug!(tenant = %tenant_id, number = %number, "tenant-side claim rejected");
        return Err(err);
    }

    let row = phone_numbers::table
        .filter(phone_numbers::number.eq(number.as_str()))
        .select(PhoneNumberRow::as_select())
        .first::<PhoneNumberRow>(connection)?;
    row_to_pool_number(row)
}

/// Distinguishes the two reasons the tenant-side conditional update can
/// match zero rows. Runs inside the claim transaction, which rolls back.
fn tenant_claim_failure(
    connection: &mut PgConnection,
    tenant_id: TenantId,
) -> NumberPoolResult<NumberPoolError> {
    let held: Option<Option<String>> = tenants::table
        .filter(tenants::id.eq(tenant_id.into_inner()))
        .select(tenants::assigned_phone_number)
        .first(connection)
        .optional()?;

    match held {
        None => Ok(NumberPoolError::UnknownTenant(tenant_id)),
        Some(Some(existing)) => {
            let number = PhoneNumber::new(existing).map_err(NumberPoolError::persistence)?;
            Ok(NumberPoolError::AlreadyAssigned { tenant_id, number })
        }
        // The conditional update matched nothing yet the column reads back
        // null; report the inconsistency.
        Some(None) => Ok(NumberPoolError::persistence(std::io::Error::other(
            format!("tenant {tenant_id} claim failed with no held number"),
        ))),
    }
}
