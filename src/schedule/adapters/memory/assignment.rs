//! In-memory assignment repository for scheduling tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::schedule::{
    domain::{
        AssignmentId, Period, TimeWindow, WorkAssignment, Worker, WorkerId, overlapping_ids,
    },
    ports::{AssignmentRepository, ScheduleRepositoryError, ScheduleRepositoryResult},
};

/// Thread-safe in-memory assignment repository.
///
/// The single state write lock doubles as the per-worker serialisation
/// point: a checked attach or reschedule holds it across its overlap check
/// and its write, matching the transactional database adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentRepository {
    state: Arc<RwLock<InMemoryScheduleState>>,
}

#[derive(Debug, Default)]
struct InMemoryScheduleState {
    assignments: HashMap<AssignmentId, WorkAssignment>,
    workers: HashMap<WorkerId, Worker>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a worker record.
    ///
    /// Worker creation belongs to the CRUD layer outside this crate; tests
    /// and development setups seed workers through this method instead.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleRepositoryError::Persistence`] when the state lock
    /// is poisoned.
    pub fn register_worker(&self, worker: Worker) -> ScheduleRepositoryResult<()> {
        let mut state = write_state(&self.state)?;
        state.workers.insert(worker.id(), worker);
        Ok(())
    }
}

fn write_state(
    state: &Arc<RwLock<InMemoryScheduleState>>,
) -> ScheduleRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryScheduleState>> {
    state
        .write()
        .map_err(|err| ScheduleRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

fn read_state(
    state: &Arc<RwLock<InMemoryScheduleState>>,
) -> ScheduleRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryScheduleState>> {
    state
        .read()
        .map_err(|err| ScheduleRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

fn blocking_sorted(state: &InMemoryScheduleState, worker_id: WorkerId) -> Vec<WorkAssignment> {
    let mut blocking: Vec<WorkAssignment> = state
        .assignments
        .values()
        .filter(|assignment| assignment.worker_id() == Some(worker_id))
        .filter(|assignment| assignment.status().blocks_schedule())
        .cloned()
        .collect();
    blocking.sort_by_key(|assignment| assignment.window().start());
    blocking
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn store(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()> {
        let mut state = write_state(&self.state)?;
        if state.assignments.contains_key(&assignment.id()) {
            return Err(ScheduleRepositoryError::DuplicateAssignment(
                assignment.id(),
            ));
        }
        state.assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn update(&self, assignment: &WorkAssignment) -> ScheduleRepositoryResult<()> {
        let mut state = write_state(&self.state)?;
        if !state.assignments.contains_key(&assignment.id()) {
            return Err(ScheduleRepositoryError::AssignmentNotFound(
                assignment.id(),
            ));
        }
        state.assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: AssignmentId,
    ) -> ScheduleRepositoryResult<Option<WorkAssignment>> {
        let state = read_state(&self.state)?;
        Ok(state.assignments.get(&id).cloned())
    }

    async fn blocking_for_worker(
        &self,
        worker_id: WorkerId,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>> {
        let state = read_state(&self.state)?;
        Ok(blocking_sorted(&state, worker_id))
    }

    async fn for_worker_intersecting(
        &self,
        worker_id: WorkerId,
        period: &Period,
    ) -> ScheduleRepositoryResult<Vec<WorkAssignment>> {
        let state = read_state(&self.state)?;
        let mut intersecting: Vec<WorkAssignment> = state
            .assignments
            .values()
            .filter(|assignment| assignment.worker_id() == Some(worker_id))
            .filter(|assignment| period.intersects(&assignment.window()))
            .cloned()
            .collect();
        intersecting.sort_by_key(|assignment| assignment.window().start());
        Ok(intersecting)
    }

    async fn find_worker(&self, worker_id: WorkerId) -> ScheduleRepositoryResult<Option<Worker>> {
        let state = read_state(&self.state)?;
        Ok(state.workers.get(&worker_id).copied())
    }

    async fn attach_worker_checked(
        &self,
        id: AssignmentId,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment> {
        let mut state = write_state(&self.state)?;
        if !state.workers.contains_key(&worker_id) {
            return Err(ScheduleRepositoryError::WorkerNotFound(worker_id));
        }
        let mut assignment = state
            .assignments
            .get(&id)
            .cloned()
            .ok_or(ScheduleRepositoryError::AssignmentNotFound(id))?;

        let blocking = blocking_sorted(&state, worker_id);
        let conflicting = overlapping_ids(&assignment.window(), Some(id), &blocking);
        if !conflicting.is_empty() {
            return Err(ScheduleRepositoryError::ScheduleConflict {
                worker_id,
                conflicting,
            });
        }

        assignment.attach_worker(worker_id, at);
        state.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    async fn reschedule_checked(
        &self,
        id: AssignmentId,
        window: TimeWindow,
        at: DateTime<Utc>,
    ) -> ScheduleRepositoryResult<WorkAssignment> {
        let mut state = write_state(&self.state)?;
        let mut assignment = state
            .assignments
            .get(&id)
            .cloned()
            .ok_or(ScheduleRepositoryError::AssignmentNotFound(id))?;

        if let Some(worker_id) = assignment.worker_id() {
            let blocking = blocking_sorted(&state, worker_id);
            let conflicting = overlapping_ids(&window, Some(id), &blocking);
            if !conflicting.is_empty() {
                return Err(ScheduleRepositoryError::ScheduleConflict {
                    worker_id,
                    conflicting,
                });
            }
        }

        assignment.reschedule(window, at);
        state.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }
}
