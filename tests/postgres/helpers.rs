//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use super::cluster::{ManagedCluster, TemporaryDatabase};
use chrono::{DateTime, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use neutra::numbering::adapters::postgres::{NumberPoolPgPool, PostgresNumberPool};
use neutra::numbering::domain::TenantId;
use neutra::schedule::adapters::postgres::PostgresAssignmentRepository;
use neutra::schedule::domain::WorkerId;
use rstest::fixture;
use uuid::Uuid;

/// SQL to create the base schema for tests.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-07-20-000000_create_allocation_tables/up.sql");

/// Template database name for pre-migrated schema.
pub const TEMPLATE_DB: &str = "neutra_test_template";

/// Prepared repository context for tests that need database access.
pub struct PreparedRepos {
    /// Temporary database created from the template.
    pub temp_db: TemporaryDatabase,
    /// Connection pool shared by the repositories.
    pub pool: NumberPoolPgPool,
    /// Number-pool repository under test.
    pub numbers: PostgresNumberPool,
    /// Assignment repository under test.
    pub assignments: PostgresAssignmentRepository,
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &ManagedCluster) -> Result<(), BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, |db_name| {
        apply_migrations(&cluster.database_url(db_name))
    })
}

fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_SCHEMA_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Creates a fully prepared repository context with template setup complete.
///
/// The pool allows several connections so claim races in tests genuinely
/// run concurrently.
#[fixture]
pub fn prepared_repos(
    postgres_cluster: PostgresCluster,
) -> Result<PreparedRepos, BoxError> {
    ensure_template(postgres_cluster)?;
    let temp_db = TemporaryDatabase::from_template(
        postgres_cluster,
        format!("test_{}", Uuid::new_v4().simple()),
        TEMPLATE_DB,
    )?;

    let manager = ConnectionManager::<PgConnection>::new(temp_db.url());
    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(|err| Box::new(err) as BoxError)?;

    Ok(PreparedRepos {
        temp_db,
        numbers: PostgresNumberPool::new(pool.clone()),
        assignments: PostgresAssignmentRepository::new(pool.clone()),
        pool,
    })
}

/// Inserts a tenant row to satisfy the claim's tenant-side update.
pub fn insert_tenant(pool: &NumberPoolPgPool) -> Result<TenantId, BoxError> {
    let tenant_id = TenantId::new();
    let mut conn = pool.get().map_err(|err| Box::new(err) as BoxError)?;
    diesel::sql_query(concat!(
        "INSERT INTO tenants (id, created_at, updated_at) ",
        "VALUES ($1, NOW(), NOW())",
    ))
    .bind::<diesel::sql_types::Uuid, _>(tenant_id.into_inner())
    .execute(&mut conn)
    .map_err(|err| Box::new(err) as BoxError)?;
    Ok(tenant_id)
}

/// Inserts a worker row with the given weekly-hours target.
pub fn insert_worker(
    pool: &NumberPoolPgPool,
    expected_weekly_hours: Option<i32>,
) -> Result<WorkerId, BoxError> {
    let worker_id = WorkerId::new();
    let mut conn = pool.get().map_err(|err| Box::new(err) as BoxError)?;
    diesel::sql_query(concat!(
        "INSERT INTO workers (id, expected_weekly_hours, created_at, updated_at) ",
        "VALUES ($1, $2, NOW(), NOW())",
    ))
    .bind::<diesel::sql_types::Uuid, _>(worker_id.into_inner())
    .bind::<diesel::sql_types::Nullable<diesel::sql_types::Int4>, _>(expected_weekly_hours)
    .execute(&mut conn)
    .map_err(|err| Box::new(err) as BoxError)?;
    Ok(worker_id)
}

/// Counts pool rows in the given status.
pub fn count_numbers_in_status(
    pool: &NumberPoolPgPool,
    status: &str,
) -> Result<i64, BoxError> {
    #[derive(diesel::QueryableByName)]
    struct CountRow {
        #[diesel(sql_type = diesel::sql_types::Int8)]
        count: i64,
    }

    let mut conn = pool.get().map_err(|err| Box::new(err) as BoxError)?;
    let row = diesel::sql_query("SELECT COUNT(*) AS count FROM phone_numbers WHERE status = $1")
        .bind::<diesel::sql_types::Text, _>(status)
        .get_result::<CountRow>(&mut conn)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(row.count)
}

/// Timestamp within the fixed test week (Monday 2025-01-06).
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}
