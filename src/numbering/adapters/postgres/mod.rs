//! `PostgreSQL` adapters for phone-number pool persistence.

mod models;
mod repository;
mod schema;

pub use repository::{NumberPoolPgPool, PostgresNumberPool};
