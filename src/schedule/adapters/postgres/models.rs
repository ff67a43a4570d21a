//! Diesel row models for work-assignment persistence.

use super::schema::{work_assignments, workers};
use crate::schedule::{
    domain::{
        AssignmentId, AssignmentStatus, PersistedAssignmentData, TimeWindow, WorkAssignment,
        Worker, WorkerId,
    },
    ports::{ScheduleRepositoryError, ScheduleRepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for assignment records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = work_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Assignment identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Attached worker, if any.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Uuid>)]
    pub worker_id: Option<uuid::Uuid>,
    /// Window start.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub start_time: DateTime<Utc>,
    /// Window length in whole minutes.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub duration_minutes: i64,
    /// Lifecycle state.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

/// Insert model for assignment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = work_assignments)]
pub struct NewAssignmentRow {
    /// Assignment identifier.
    pub id: uuid::Uuid,
    /// Attached worker, if any.
    pub worker_id: Option<uuid::Uuid>,
    /// Window start.
    pub start_time: DateTime<Utc>,
    /// Window length in whole minutes.
    pub duration_minutes: i64,
    /// Lifecycle state.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for worker records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = workers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkerRow {
    /// Worker identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Weekly-hours display target.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Int4>)]
    pub expected_weekly_hours: Option<i32>,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

/// Maps an assignment aggregate to its insert row.
pub fn to_new_row(assignment: &WorkAssignment) -> NewAssignmentRow {
    NewAssignmentRow {
        id: assignment.id().into_inner(),
        worker_id: assignment.worker_id().map(WorkerId::into_inner),
        start_time: assignment.window().start(),
        duration_minutes: assignment.window().duration_minutes(),
        status: assignment.status().as_str().to_owned(),
        created_at: assignment.created_at(),
        updated_at: assignment.updated_at(),
    }
}

/// Rehydrates an assignment aggregate from its query row.
pub fn row_to_assignment(row: AssignmentRow) -> ScheduleRepositoryResult<WorkAssignment> {
    let AssignmentRow {
        id,
        worker_id,
        start_time,
        duration_minutes,
        status: persisted_status,
        created_at,
        updated_at,
    } = row;

    let window = TimeWindow::new(start_time, duration_minutes)
        .map_err(ScheduleRepositoryError::persistence)?;
    let status = AssignmentStatus::try_from(persisted_status.as_str())
        .map_err(ScheduleRepositoryError::persistence)?;

    let data = PersistedAssignmentData {
        id: AssignmentId::from_uuid(id),
        worker_id: worker_id.map(WorkerId::from_uuid),
        window,
        status,
        created_at,
        updated_at,
    };
    Ok(WorkAssignment::from_persisted(data))
}

/// Rehydrates a worker read model from its query row.
pub fn row_to_worker(row: &WorkerRow) -> ScheduleRepositoryResult<Worker> {
    let expected = row
        .expected_weekly_hours
        .map(u32::try_from)
        .transpose()
        .map_err(ScheduleRepositoryError::persistence)?;
    Ok(Worker::new(WorkerId::from_uuid(row.id), expected))
}
