//! Work-assignment aggregate root and its lifecycle.

use super::{AssignmentId, ParseAssignmentStatusError, ScheduleDomainError, TimeWindow, WorkerId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Work-assignment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Assignment has been captured but not yet committed to the schedule.
    Pending,
    /// Assignment is committed to the schedule.
    Scheduled,
    /// Work is underway.
    InProgress,
    /// Work finished.
    Completed,
    /// Assignment was called off.
    Cancelled,
}

impl AssignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when the assignment occupies its worker's schedule.
    ///
    /// Completed and cancelled assignments are history; everything else
    /// takes part in overlap checks.
    #[must_use]
    pub const fn blocks_schedule(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns `true` when the assignment counts toward worked time.
    ///
    /// Pending work is not yet committed and cancelled work never happened;
    /// neither contributes to the aggregate.
    #[must_use]
    pub const fn counts_toward_worked_time(self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress | Self::Completed)
    }

    /// Returns `true` when no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Scheduled | Self::Cancelled)
                | (
                    Self::Scheduled,
                    Self::InProgress | Self::Completed | Self::Cancelled
                )
                | (Self::InProgress, Self::Completed | Self::Cancelled)
        )
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseAssignmentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseAssignmentStatusError(value.to_owned())),
        }
    }
}

/// Work-assignment aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAssignment {
    id: AssignmentId,
    worker_id: Option<WorkerId>,
    window: TimeWindow,
    status: AssignmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted work assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssignmentData {
    /// Persisted assignment identifier.
    pub id: AssignmentId,
    /// Persisted worker attachment, if any.
    pub worker_id: Option<WorkerId>,
    /// Persisted occupancy window.
    pub window: TimeWindow,
    /// Persisted lifecycle state.
    pub status: AssignmentStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WorkAssignment {
    /// Creates a new unattached assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidInitialStatus`] when the
    /// initial status is not `Pending` or `Scheduled`.
    pub fn new(
        window: TimeWindow,
        status: AssignmentStatus,
        clock: &impl Clock,
    ) -> Result<Self, ScheduleDomainError> {
        if !matches!(
            status,
            AssignmentStatus::Pending | AssignmentStatus::Scheduled
        ) {
            return Err(ScheduleDomainError::InvalidInitialStatus(
                status.as_str().to_owned(),
            ));
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: AssignmentId::new(),
            worker_id: None,
            window,
            status,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedAssignmentData) -> Self {
        Self {
            id: data.id,
            worker_id: data.worker_id,
            window: data.window,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the attached worker, if any.
    #[must_use]
    pub const fn worker_id(&self) -> Option<WorkerId> {
        self.worker_id
    }

    /// Returns the occupancy window.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        self.window
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Attaches a worker.
    ///
    /// The conflict check against the worker's other assignments is the
    /// repository's transactional concern; this mutator only records the
    /// attachment.
    pub fn attach_worker(&mut self, worker_id: WorkerId, at: DateTime<Utc>) {
        self.worker_id = Some(worker_id);
        self.updated_at = at;
    }

    /// Detaches the current worker.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::NoWorkerAttached`] when no worker is
    /// attached.
    pub fn detach_worker(&mut self, at: DateTime<Utc>) -> Result<(), ScheduleDomainError> {
        if self.worker_id.is_none() {
            return Err(ScheduleDomainError::NoWorkerAttached);
        }
        self.worker_id = None;
        self.updated_at = at;
        Ok(())
    }

    /// Moves the assignment to a new occupancy window.
    pub fn reschedule(&mut self, window: TimeWindow, at: DateTime<Utc>) {
        self.window = window;
        self.updated_at = at;
    }

    /// Transitions the lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidStatusTransition`] when the
    /// lifecycle does not permit the move.
    pub fn transition_to(
        &mut self,
        next: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> Result<(), ScheduleDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(ScheduleDomainError::InvalidStatusTransition {
                from: self.status.as_str().to_owned(),
                to: next.as_str().to_owned(),
            });
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }
}

/// Collects the ids of assignments whose windows overlap the candidate.
///
/// Used by the advisory conflict check and by the transactional attach and
/// reschedule paths, so every caller applies the same half-open overlap
/// rule. `exclude` removes the assignment being rescheduled from its own
/// comparison set.
#[must_use]
pub fn overlapping_ids(
    candidate: &TimeWindow,
    exclude: Option<AssignmentId>,
    others: &[WorkAssignment],
) -> Vec<AssignmentId> {
    others
        .iter()
        .filter(|existing| exclude.is_none_or(|id| existing.id() != id))
        .filter(|existing| existing.window().overlaps(candidate))
        .map(WorkAssignment::id)
        .collect()
}
