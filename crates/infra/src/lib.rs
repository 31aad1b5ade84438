//! Infrastructure layer: inspection orchestration, the in-memory host,
//! event storage, read models and configuration.

pub mod config;
pub mod event_store;
pub mod host;
pub mod inspection;
pub mod projections;
pub mod read_model;

pub use config::{ConfigError, InspectionConfig};
pub use host::{InMemoryHost, InMemorySession};
pub use inspection::{HostSession, InspectionEngine, InspectionError, LedgerError};

#[cfg(test)]
mod integration_tests;
