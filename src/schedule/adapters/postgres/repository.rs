//! `PostgreSQL` repository implementation for work-assignment storage.

use super::{
    models::{AssignmentRow, WorkerRow, row_to_assignment, row_to_worker, to_new_row},
    schema::{work_assignments, workers},
};
use crate::schedule::{
    domain::{
        AssignmentId, AssignmentStatus, Period, TimeWindow, WorkAssignment, Worker, WorkerId,
        overlapping_ids,
    },
    ports::{AssignmentRepository, ScheduleRepositoryError, ScheduleRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by schedule adapters.
pub type SchedulePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed assignment repository.
///
/// The checked attach and reschedule operations take a `FOR UPDATE` row
/// lock on the worker before checking for overlaps, so concurrent writers
/// against one worker's schedule queue behind each other while different
/// workers proceed in parallel.
#[derive(Debug, Clone)]
pub struct PostgresAssignmentRepository {
    pool: SchedulePgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SchedulePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ScheduleRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ScheduleRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ScheduleRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ScheduleRepositoryError::persistence)?
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn store(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()> {
        let assignment_id = assignment.id();
        let new_row = to_new_row(assignment);

        self.run_blocking(move |connection| {
            diesel::insert_into(work_assignments::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ScheduleRepositoryError::DuplicateAssignment(assignment_id)
                    }
                    _ => ScheduleRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()> {
        let assignment_id = assignment.id();
        let row = to_new_row(assignment);

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                work_assignments::table.filter(work_assignments::id.eq(row.id)),
            )
            .set((
                work_assignments::worker_id.eq(row.worker_id),
                work_assignments::start_time.eq(row.start_time),
                work_assignments::duration_minutes.eq(row.duration_minutes),
                work_assignments::status.eq(row.status.clone()),
                work_assignments::updated_at.eq(row.updated_at),
            ))
            .execute(connection)?;

            if updated == 0 {
                return Err(ScheduleRepositoryError::AssignmentNotFound(assignment_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: AssignmentId,
    ) -> ScheduleRepositoryResult<Option<WorkAssignment>> {
        let uuid = id.into_inner();
        self.run_blocking(move |connection| {
            let row = work_assignments::table
                .filter(work_assignments::id.eq(uuid))
                .select(AssignmentRow::as_select())
                .first::<AssignmentRow>(connection)
                .optional()?;
            row.map(row_to_assignment).transpose()
        })
        .await
    }

    async fn blocking_for_worker(
        &self,
        worker_id: WorkerId,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>> {
        let worker_uuid = worker_id.into_inner();
        self.run_blocking(move |connection| load_blocking(connection, worker_uuid))
            .await
    }

    async fn for_worker_intersecting(
        &self,
        worker_id: WorkerId,
        period: &Period,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>> {
        let worker_uuid = worker_id.into_inner();
        let period_start = period.start();
        let period_end = period.end();

        self.run_blocking(move |connection| {
            // Window intersection in SQL: start < period_end AND
            // start + duration > period_start.
            let rows = diesel::sql_query(concat!(
                "SELECT id, worker_id, start_time, duration_minutes, status, ",
                "created_at, updated_at FROM work_assignments ",
                "WHERE worker_id = $1 ",
                "AND start_time < $2 ",
                "AND start_time + make_interval(mins => duration_minutes::INT) > $3 ",
                "ORDER BY start_time ASC",
            ))
            .bind::<diesel::sql_types::Uuid, _>(worker_uuid)
            .bind::<diesel::sql_types::Timestamptz, _>(period_end)
            .bind::<diesel::sql_types::Timestamptz, _>(period_start)
            .load::<AssignmentRow>(connection)?;

            rows.into_iter().map(row_to_assignment).collect()
        })
        .await
    }

    async fn find_worker(&self, worker_id: WorkerId) -> ScheduleRepositoryResult<Option<Worker>> {
        let worker_uuid = worker_id.into_inner();
        self.run_blocking(move |connection| {
            let row = workers::table
                .filter(workers::id.eq(worker_uuid))
                .select(WorkerRow::as_select())
                .first::<WorkerRow>(connection)
                .optional()?;
            row.as_ref().map(row_to_worker).transpose()
        })
        .await
    }

    async fn attach_worker_checked(
        &self,
        id: AssignmentId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ScheduleRepositoryError, _>(|tx_conn| {
                lock_worker_row(tx_conn, worker_id)?;

                let assignment = find_assignment_in_tx(tx_conn, id)?;
                let blocking = load_blocking(tx_conn, worker_id.into_inner())?;
                let conflicting = overlapping_ids(&assignment.window(), Some(id), &blocking);
                if !conflicting.is_empty() {
                    tracing::debug!(
                        worker = %worker_id,
                        assignment = %id,
                        conflicts = conflicting.len(),
                        "attach rejected with schedule conflict"
                    );
                    return Err(ScheduleRepositoryError::ScheduleConflict {
                        worker_id,
                        conflicting,
                    });
                }

                diesel::update(work_assignments::table.filter(work_assignments::id.eq(id.into_inner())))
                    .set((
                        work_assignments::worker_id.eq(worker_id.into_inner()),
                        work_assignments::updated_at.eq(at),
                    ))
                    .execute(tx_conn)?;

                find_assignment_in_tx(tx_conn, id)
            })
        })
        .await
    }

    async fn reschedule_checked(
        &self,
        id: AssignmentId,
        window: TimeWindow,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ScheduleRepositoryError, _>(|tx_conn| {
                let assignment = find_assignment_in_tx(tx_conn, id)?;

                if let Some(worker_id) = assignment.worker_id() {
                    lock_worker_row(tx_conn, worker_id)?;
                    let blocking = load_blocking(tx_conn, worker_id.into_inner())?;
                    let conflicting = overlapping_ids(&window, Some(id), &blocking);
                    if !conflicting.is_empty() {
                        return Err(ScheduleRepositoryError::ScheduleConflict {
                            worker_id,
                            conflicting,
                        });
                    }
                }

                diesel::update(work_assignments::table.filter(work_assignments::id.eq(id.into_inner())))
                    .set((
                        work_assignments::start_time.eq(window.start()),
                        work_assignments::duration_minutes.eq(window.duration_minutes()),
                        work_assignments::updated_at.eq(at),
                    ))
                    .execute(tx_conn)?;

                find_assignment_in_tx(tx_conn, id)
            })
        })
        .await
    }
}

#[derive(QueryableByName)]
struct LockedWorkerRow {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    #[expect(dead_code, reason = "row is fetched only to take the lock")]
    id: uuid::Uuid,
}

/// Takes the per-worker serialisation lock for the current transaction.
fn lock_worker_row(
    connection: &mut PgConnection,
    worker_id: WorkerId,
) -> ScheduleRepositoryResult<()> {
    let row = diesel::sql_query("SELECT id FROM workers WHERE id = $1 FOR UPDATE")
        .bind::<diesel::sql_types::Uuid, _>(worker_id.into_inner())
        .get_result::<LockedWorkerRow>(connection)
        .optional()?;
    if row.is_none() {
        return Err(ScheduleRepositoryError::WorkerNotFound(worker_id));
    }
    Ok(())
}

fn find_assignment_in_tx(
    connection: &mut PgConnection,
    id: AssignmentId,
) -> ScheduleRepositoryResult<WorkAssignment> {
    let row = work_assignments::table
        .filter(work_assignments::id.eq(id.into_inner()))
        .select(AssignmentRow::as_select())
        .first::<AssignmentRow>(connection)
        .optional()?;
    row.map(row_to_assignment)
        .transpose()?
        .ok_or(ScheduleRepositoryError::AssignmentNotFound(id))
}

/// Loads a worker's schedule-blocking assignments, earliest window first.
fn load_blocking(
    connection: &mut PgConnection,
    worker_uuid: uuid::Uuid,
) -> ScheduleRepositoryResult<Vec<WorkAssignment>> {
    let terminal = [
        AssignmentStatus::Completed.as_str(),
        AssignmentStatus::Cancelled.as_str(),
    ];
    let rows = work_assignments::table
        .filter(work_assignments::worker_id.eq(worker_uuid))
        .filter(diesel::dsl::not(work_assignments::status.eq_any(terminal)))
        .order(work_assignments::start_time.asc())
        .select(AssignmentRow::as_select())
        .load::<AssignmentRow>(connection)?;
    rows.into_iter().map(row_to_assignment).collect()
}
