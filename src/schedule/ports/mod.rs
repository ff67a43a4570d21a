//! Port contracts for the schedule context.

mod repository;

pub use repository::{AssignmentRepository, ScheduleRepositoryError, ScheduleRepositoryResult};
