//! Phone-number pool allocation for Neutra.
//!
//! This module hands out phone numbers from a shared, finite pool such that
//! no two tenants ever receive the same number and a tenant holds at most
//! one number. The claim step is a single conditional state transition, so
//! concurrent allocation attempts racing for the same number resolve to
//! exactly one winner. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
