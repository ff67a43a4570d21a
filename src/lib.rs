//! Neutra: shared-resource allocation and schedule-conflict core.
//!
//! This crate provides the concurrency-sensitive core of a multi-tenant
//! business-operations backend: handing out phone numbers from a shared,
//! finite pool without ever double-assigning one, and keeping workers from
//! being booked into overlapping jobs.
//!
//! # Architecture
//!
//! Neutra follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`numbering`]: Phone-number pool allocation, one number per tenant
//! - [`schedule`]: Work-assignment conflict detection and worked-time
//!   aggregation

pub mod numbering;
pub mod schedule;
