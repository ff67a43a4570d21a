//! Shared test helpers for in-memory integration tests.

use chrono::{DateTime, TimeZone, Utc};
use mockable::DefaultClock;
use neutra::numbering::{
    adapters::memory::InMemoryNumberPool,
    domain::TenantId,
    services::NumberAllocationService,
};
use neutra::schedule::{
    adapters::memory::InMemoryAssignmentRepository,
    domain::{Worker, WorkerId},
    services::AssignmentScheduleService,
};
use rstest::fixture;
use std::sync::Arc;

/// Allocation service wired to a shared in-memory pool.
pub struct AllocationHarness {
    /// The underlying pool, exposed for tenant seeding.
    pub pool: InMemoryNumberPool,
    /// Service under test.
    pub service: NumberAllocationService<InMemoryNumberPool, DefaultClock>,
}

/// Provides a fresh allocation harness for each test.
#[fixture]
pub fn allocation() -> AllocationHarness {
    let pool = InMemoryNumberPool::new();
    let service = NumberAllocationService::new(Arc::new(pool.clone()), Arc::new(DefaultClock));
    AllocationHarness { pool, service }
}

/// Registers a fresh tenant on the harness pool.
pub fn registered_tenant(harness: &AllocationHarness) -> TenantId {
    let tenant_id = TenantId::new();
    harness
        .pool
        .register_tenant(tenant_id)
        .expect("tenant registration");
    tenant_id
}

/// Scheduling service wired to a shared in-memory repository.
pub struct ScheduleHarness {
    /// The underlying repository, exposed for worker seeding.
    pub repository: Arc<InMemoryAssignmentRepository>,
    /// Service under test.
    pub service: AssignmentScheduleService<InMemoryAssignmentRepository, DefaultClock>,
}

/// Provides a fresh scheduling harness for each test.
#[fixture]
pub fn schedule() -> ScheduleHarness {
    let repository = Arc::new(InMemoryAssignmentRepository::new());
    let service = AssignmentScheduleService::new(Arc::clone(&repository), Arc::new(DefaultClock));
    ScheduleHarness {
        repository,
        service,
    }
}

/// Registers a fresh worker on the harness repository.
pub fn registered_worker(harness: &ScheduleHarness) -> WorkerId {
    let worker_id = WorkerId::new();
    harness
        .repository
        .register_worker(Worker::new(worker_id, Some(40)))
        .expect("worker registration");
    worker_id
}

/// Timestamp within the fixed test week (Monday 2025-01-06).
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}
