//! Projection implementations (read model builders).
//!
//! Projections consume published envelopes and build query-optimized read
//! models. All projections are:
//! - **Rebuildable**: can be reconstructed from the event stream
//! - **Tenant-isolated**: data is partitioned by tenant
//! - **Idempotent**: safe for at-least-once delivery

pub mod inspection_history;

pub use inspection_history::{
    HistoryKey, InspectionHistoryEntry, InspectionHistoryError, InspectionHistoryProjection,
};
