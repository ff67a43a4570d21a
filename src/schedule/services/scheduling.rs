//! Service layer for assignment creation and the worker-attach lifecycle.

use crate::schedule::{
    domain::{
        AssignmentId, AssignmentStatus, ScheduleDomainError, TimeWindow, WorkAssignment, WorkerId,
    },
    ports::{AssignmentRepository, ScheduleRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a work assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateAssignmentRequest {
    start_time: DateTime<Utc>,
    duration_minutes: i64,
    status: AssignmentStatus,
}

impl CreateAssignmentRequest {
    /// Creates a request for a scheduled assignment.
    #[must_use]
    pub const fn new(start_time: DateTime<Utc>, duration_minutes: i64) -> Self {
        Self {
            start_time,
            duration_minutes,
            status: AssignmentStatus::Scheduled,
        }
    }

    /// Sets the initial lifecycle state.
    #[must_use]
    pub const fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.status = status;
        self
    }
}

/// Service-level errors for scheduling operations.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ScheduleDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ScheduleRepositoryError),
}

impl SchedulingError {
    /// Returns the overlapping assignment ids when the error is a schedule
    /// conflict, for presenting every collision to the user.
    #[must_use]
    pub fn conflicting_assignments(&self) -> Option<&[AssignmentId]> {
        match self {
            Self::Repository(ScheduleRepositoryError::ScheduleConflict { conflicting, .. }) => {
                Some(conflicting)
            }
            _ => None,
        }
    }
}

/// Result type for scheduling service operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Assignment scheduling orchestration service.
pub struct AssignmentScheduleService<R, C>
where
    R: AssignmentRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for AssignmentScheduleService<R, C>
where
    R: AssignmentRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> AssignmentScheduleService<R, C>
where
    R: AssignmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new scheduling service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates and persists an unattached assignment.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Domain`] when the window or initial
    /// status is invalid, or [`SchedulingError::Repository`] when
    /// persistence fails.
    pub async fn create(
        &self,
        request: CreateAssignmentRequest,
    ) -> SchedulingResult<WorkAssignment> {
        let window = TimeWindow::new(request.start_time, request.duration_minutes)?;
        let assignment = WorkAssignment::new(window, request.status, &*self.clock)?;
        self.repository.store(&assignment).await?;
        Ok(assignment)
    }

    /// Retrieves an assignment by identifier.
    ///
    /// Returns `Ok(None)` when the assignment does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Repository`] when the lookup fails.
    pub async fn find(&self, id: AssignmentId) -> SchedulingResult<Option<WorkAssignment>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Attaches a worker to an assignment.
    ///
    /// The overlap check and the write run in one repository transaction
    /// serialised per worker; a conflict aborts the attach and reports
    /// every overlapping assignment. Conflicts are never auto-resolved.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Repository`] carrying the conflict, a
    /// missing assignment, or a missing worker.
    pub async fn attach_worker(
        &self,
        id: AssignmentId,
        worker_id: WorkerId,
    ) -> SchedulingResult<WorkAssignment> {
        let attached = self
            .repository
            .attach_worker_checked(id, worker_id, self.clock.utc())
            .await?;
        tracing::debug!(assignment = %id, worker = %worker_id, "worker attached");
        Ok(attached)
    }

    /// Detaches the worker from an assignment.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Domain`] when no worker is attached, or
    /// [`SchedulingError::Repository`] when the assignment is missing.
    pub async fn detach_worker(&self, id: AssignmentId) -> SchedulingResult<WorkAssignment> {
        let mut assignment = self.find_or_error(id).await?;
        assignment.detach_worker(self.clock.utc())?;
        self.repository.update(&assignment).await?;
        Ok(assignment)
    }

    /// Moves an assignment to a new window.
    ///
    /// When a worker is attached the overlap check runs inside the writing
    /// transaction with the assignment excluded from its own comparison
    /// set, so rescheduling within the original slot never self-conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Domain`] when the window is invalid, or
    /// [`SchedulingError::Repository`] carrying the conflict or a missing
    /// assignment.
    pub async fn reschedule(
        &self,
        id: AssignmentId,
        start_time: DateTime<Utc>,
        duration_minutes: i64,
    ) -> SchedulingResult<WorkAssignment> {
        let window = TimeWindow::new(start_time, duration_minutes)?;
        let rescheduled = self
            .repository
            .reschedule_checked(id, window, self.clock.utc())
            .await?;
        Ok(rescheduled)
    }

    /// Transitions an assignment's lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Domain`] when the lifecycle does not
    /// permit the move, or [`SchedulingError::Repository`] when the
    /// assignment is missing.
    pub async fn transition(
        &self,
        id: AssignmentId,
        next: AssignmentStatus,
    ) -> SchedulingResult<WorkAssignment> {
        let mut assignment = self.find_or_error(id).await?;
        assignment.transition_to(next, self.clock.utc())?;
        self.repository.update(&assignment).await?;
        Ok(assignment)
    }

    async fn find_or_error(&self, id: AssignmentId) -> SchedulingResult<WorkAssignment> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ScheduleRepositoryError::AssignmentNotFound(id).into())
    }
}
