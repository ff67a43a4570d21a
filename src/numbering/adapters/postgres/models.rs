//! Diesel row models for phone-number pool persistence.

use super::schema::phone_numbers;
use crate::numbering::{
    domain::{NumberStatus, PersistedPoolNumberData, PhoneNumber, PoolNumber, TenantId},
    ports::{NumberPoolError, NumberPoolResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for pool-number records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = phone_numbers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PhoneNumberRow {
    /// E.164 phone number.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub number: String,
    /// Assignment status.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Holding tenant when assigned.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Uuid>)]
    pub assigned_tenant_id: Option<uuid::Uuid>,
    /// Assignment timestamp when assigned.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub assigned_at: Option<DateTime<Utc>>,
    /// Pool-entry timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
}

/// Insert model for pool-number records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = phone_numbers)]
pub struct NewPhoneNumberRow {
    /// E.164 phone number.
    pub number: String,
    /// Assignment status.
    pub status: String,
    /// Holding tenant when assigned.
    pub assigned_tenant_id: Option<uuid::Uuid>,
    /// Assignment timestamp when assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Pool-entry timestamp.
    pub created_at: DateTime<Utc>,
}

/// Maps a pool aggregate to its insert row.
pub fn to_new_row(entry: &PoolNumber) -> NewPhoneNumberRow {
    NewPhoneNumberRow {
        number: entry.number().to_string(),
        status: entry.status().as_str().to_owned(),
        assigned_tenant_id: entry.assigned_tenant_id().map(TenantId::into_inner),
        assigned_at: entry.assigned_at(),
        created_at: entry.created_at(),
    }
}

/// Rehydrates a pool aggregate from its query row.
pub fn row_to_pool_number(row: PhoneNumberRow) -> NumberPoolResult<PoolNumber> {
    let PhoneNumberRow {
        number: raw_number,
        status: persisted_status,
        assigned_tenant_id,
        assigned_at,
        created_at,
    } = row;

    let number = PhoneNumber::new(raw_number).map_err(NumberPoolError::persistence)?;
    let status =
        NumberStatus::try_from(persisted_status.as_str()).map_err(NumberPoolError::persistence)?;

    let data = PersistedPoolNumberData {
        number,
        status,
        assigned_tenant_id: assigned_tenant_id.map(TenantId::from_uuid),
        assigned_at,
        created_at,
    };
    PoolNumber::from_persisted(data).map_err(NumberPoolError::persistence)
}
