//! Repository port for work-assignment persistence and the serialised
//! attach path.

use crate::schedule::domain::{
    AssignmentId, Period, TimeWindow, WorkAssignment, Worker, WorkerId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for schedule repository operations.
pub type ScheduleRepositoryResult<T> = Result<T, ScheduleRepositoryError>;

/// Work-assignment persistence contract.
///
/// The check-then-write operations ([`Self::attach_worker_checked`] and
/// [`Self::reschedule_checked`]) run their overlap check and their write in
/// one transaction serialised per worker, closing the gap where two
/// concurrent requests both pass an advisory check before either commits.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Stores a new assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::DuplicateAssignment`] when the
    /// assignment ID already exists.
    async fn store(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()>;

    /// Persists changes to an existing assignment (detach, status,
    /// timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::AssignmentNotFound`] when the
    /// assignment does not exist.
    async fn update(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()>;

    /// Finds an assignment by identifier.
    ///
    /// Returns `None` when the assignment does not exist.
    async fn find_by_id(
        &self,
        id: AssignmentId,
    ) -> ScheduleRepositoryResult<Option<WorkAssignment>>;

    /// Returns the worker's schedule-blocking assignments, earliest window
    /// first.
    ///
    /// Completed and cancelled assignments are excluded; past windows are
    /// not.
    async fn blocking_for_worker(
        &self,
        worker_id: WorkerId,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>>;

    /// Returns the worker's assignments whose windows intersect the period,
    /// regardless of status, earliest window first.
    async fn for_worker_intersecting(
        &self,
        worker_id: WorkerId,
        period: &Period,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>>;

    /// Finds a worker record.
    ///
    /// Returns `None` when the worker does not exist.
    async fn find_worker(&self, worker_id: WorkerId) -> ScheduleRepositoryResult<Option<Worker>>;

    /// Attaches a worker to an assignment behind the per-worker
    /// serialisation point.
    ///
    /// Re-runs the overlap check against the worker's blocking assignments
    /// (excluding the assignment itself) inside the transaction that writes
    /// the attachment. Two concurrent attaches into the same slot: exactly
    /// one commits.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::ScheduleConflict`] listing every
    /// overlapping assignment,
    /// [`ScheduleRepositoryError::AssignmentNotFound`] or
    /// [`ScheduleRepositoryError::WorkerNotFound`] when either side is
    /// missing.
    async fn attach_worker_checked(
        &self,
        id: AssignmentId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment>;

    /// Moves an assignment to a new window behind the same per-worker
    /// serialisation point as the attach path.
    ///
    /// When the assignment has an attached worker the overlap check runs
    /// against that worker's other blocking assignments inside the writing
    /// transaction; unattached assignments are moved without a check.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::ScheduleConflict`] listing every
    /// overlapping assignment, or
    /// [`ScheduleRepositoryError::AssignmentNotFound`] when the assignment
    /// is missing.
    async fn reschedule_checked(
        &self,
        id: AssignmentId,
        window: TimeWindow,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment>;
}

/// Errors returned by schedule repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ScheduleRepositoryError {
    /// An assignment with the same identifier already exists.
    #[error("duplicate assignment identifier: {0}")]
    DuplicateAssignment(AssignmentId),

    /// The assignment was not found.
    #[error("assignment not found: {0}")]
    AssignmentNotFound(AssignmentId),

    /// The worker was not found.
    #[error("worker not found: {0}")]
    WorkerNotFound(WorkerId),

    /// The attach or reschedule would double-book the worker.
    #[error("schedule conflict for worker {worker_id}: {} overlapping assignment(s)", .conflicting.len())]
    ScheduleConflict {
        /// The worker whose schedule would be double-booked.
        worker_id: WorkerId,
        /// Every assignment overlapping the requested window.
        conflicting: Vec<AssignmentId>,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ScheduleRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for ScheduleRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
