//! Host implementations of the inspection collaborator ports.

mod in_memory;
mod ledger;

pub use in_memory::{InMemoryHost, InMemorySession, InspectionEnvelope, REPORT_AGGREGATE_TYPE};
