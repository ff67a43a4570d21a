//! `PostgreSQL` adapters for work-assignment persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresAssignmentRepository, SchedulePgPool};
