//! Port contracts for the numbering context.

mod repository;

pub use repository::{NumberPoolError, NumberPoolRepository, NumberPoolResult};
