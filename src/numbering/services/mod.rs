//! Orchestration services for the numbering context.

mod allocation;

pub use allocation::{
    AssignNumberRequest, NumberAllocationError, NumberAllocationResult, NumberAllocationService,
};
