//! Inspection workflow: collaborator ports, the engine that drives them and
//! per-receipt creation locks.

pub mod engine;
pub mod error;
pub mod ports;
pub mod receipt_lock;

pub use engine::InspectionEngine;
pub use error::{InspectionError, InspectionResult};
pub use ports::{
    HostSession, LedgerError, LedgerResult, LocationRegistry, MovementService,
    OperationTypeRegistry, ReceiptSource, ReportStore, SequenceGenerator,
};
pub use receipt_lock::{ReceiptLockGuard, ReceiptLocks};
