//! Worked-time aggregation over scheduling periods.

use crate::schedule::{
    domain::{Period, ScheduleDomainError, WorkerId},
    ports::{AssignmentRepository, ScheduleRepositoryError},
};
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

/// Worked time joined with the worker's display target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedTimeSummary {
    /// Total committed time within the period.
    pub worked: Duration,
    /// The worker's weekly-hours target, if configured.
    pub expected_weekly_hours: Option<u32>,
}

/// Service-level errors for worked-time aggregation.
#[derive(Debug, Error)]
pub enum WorkedTimeError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ScheduleDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ScheduleRepositoryError),
}

/// Result type for worked-time operations.
pub type WorkedTimeResult<T> = Result<T, WorkedTimeError>;

/// Worked-time aggregation service.
///
/// A pure read over assignment records; safe to call concurrently and
/// repeatedly.
#[derive(Clone)]
pub struct WorkedTimeAggregator<R>
where
    R: AssignmentRepository,
{
    repository: Arc<R>,
}

impl<R> WorkedTimeAggregator<R>
where
    R: AssignmentRepository,
{
    /// Creates a new aggregator.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Sums the committed minutes of a worker's assignments intersecting
    /// the period.
    ///
    /// Only scheduled, in-progress, and completed assignments count;
    /// pending work is not yet committed and cancelled work never happened.
    /// An assignment that only partially falls inside the period
    /// contributes its full duration; downstream displays rely on this
    /// behaviour, so it is kept rather than clipping to the period.
    ///
    /// # Errors
    ///
    /// Returns [`WorkedTimeError::Repository`] when the lookup fails.
    pub async fn worked_minutes(
        &self,
        worker_id: WorkerId,
        period: &Period,
    ) -> WorkedTimeResult<Duration> {
        let assignments = self
            .repository
            .for_worker_intersecting(worker_id, period)
            .await?;

        let total_minutes: i64 = assignments
            .iter()
            .filter(|assignment| assignment.status().counts_toward_worked_time())
            .map(|assignment| assignment.window().duration_minutes())
            .sum();

        Ok(Duration::minutes(total_minutes))
    }

    /// Returns the worked time alongside the worker's weekly-hours target.
    ///
    /// # Errors
    ///
    /// Returns [`WorkedTimeError::Repository`] when the worker does not
    /// exist or a lookup fails.
    pub async fn weekly_summary(
        &self,
        worker_id: WorkerId,
        period: &Period,
    ) -> WorkedTimeResult<WorkedTimeSummary> {
        let worker = self
            .repository
            .find_worker(worker_id)
            .await?
            .ok_or(ScheduleRepositoryError::WorkerNotFound(worker_id))?;
        let worked = self.worked_minutes(worker_id, period).await?;

        Ok(WorkedTimeSummary {
            worked,
            expected_weekly_hours: worker.expected_weekly_hours(),
        })
    }
}
