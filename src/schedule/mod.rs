//! Work-assignment scheduling for Neutra.
//!
//! This module keeps a worker's active assignments pairwise disjoint in
//! time: a conflict check over half-open windows, a transactional
//! check-then-attach path serialised per worker, and a worked-time
//! aggregation over scheduling periods. The module follows hexagonal
//! architecture:
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
