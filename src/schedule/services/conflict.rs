//! Advisory schedule-conflict check.
//!
//! Provides [`ConflictDetector`] which decides whether a candidate window
//! is legal given a worker's existing commitments. The check is a pure
//! read; the authoritative re-check happens inside the repository's
//! transactional attach and reschedule paths.

use crate::schedule::{
    domain::{AssignmentId, ScheduleDomainError, TimeWindow, WorkerId, overlapping_ids},
    ports::{AssignmentRepository, ScheduleRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// The candidate window is free.
    NoConflict,
    /// Every existing assignment overlapping the candidate window.
    Conflict(Vec<AssignmentId>),
}

impl ConflictOutcome {
    /// Returns `true` when overlaps were found.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns the conflicting assignment ids, if any.
    #[must_use]
    pub fn conflicting(&self) -> &[AssignmentId] {
        match self {
            Self::NoConflict => &[],
            Self::Conflict(ids) => ids,
        }
    }
}

/// Service-level errors for conflict checks.
#[derive(Debug, Error)]
pub enum ConflictCheckError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ScheduleDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ScheduleRepositoryError),
}

/// Result type for conflict check operations.
pub type ConflictCheckResult<T> = Result<T, ConflictCheckError>;

/// Schedule-conflict detection service.
#[derive(Clone)]
pub struct ConflictDetector<R>
where
    R: AssignmentRepository,
{
    repository: Arc<R>,
}

impl<R> ConflictDetector<R>
where
    R: AssignmentRepository,
{
    /// Creates a new conflict detector.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Checks a candidate window against a worker's blocking assignments.
    ///
    /// Completed and cancelled assignments never conflict; windows that
    /// merely touch do not conflict; windows already in the past still do.
    /// `exclude` removes an assignment being rescheduled from its own
    /// comparison set.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictCheckError::Repository`] when the lookup fails.
    pub async fn check(
        &self,
        worker_id: WorkerId,
        window: TimeWindow,
        exclude: Option<AssignmentId>,
    ) -> ConflictCheckResult<ConflictOutcome> {
        let blocking = self.repository.blocking_for_worker(worker_id).await?;
        let conflicting = overlapping_ids(&window, exclude, &blocking);

        if conflicting.is_empty() {
            Ok(ConflictOutcome::NoConflict)
        } else {
            tracing::debug!(
                worker = %worker_id,
                conflicts = conflicting.len(),
                "candidate window overlaps existing assignments"
            );
            Ok(ConflictOutcome::Conflict(conflicting))
        }
    }
}
