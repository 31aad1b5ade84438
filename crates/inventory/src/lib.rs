//! Inventory domain: stock locations, lots, receipts, internal transfers and
//! the quality inspection of received goods.
//!
//! Everything here is deterministic domain logic. The stock ledger itself is
//! a host collaborator; this crate only describes the requests sent to it and
//! the records it hands back.

pub mod inspection;
pub mod location;
pub mod lot;
pub mod receipt;
pub mod transfer;

pub use inspection::{
    CheckItem, CheckResult, Conclusion, InspectionCommand, InspectionEvent, InspectionLine,
    InspectionReport, InspectionReportId, InspectionSettings, InspectionStatus, LineDetails,
    NewInspectionLine, SampleMovement,
};
pub use location::{Location, LocationId, LocationUsage, NewLocation};
pub use lot::{LotId, LotRef};
pub use receipt::{Receipt, ReceiptId, ReceiptLine, ReceiptStatus, ReceivedProduct};
pub use transfer::{
    Movement, MovementId, MovementRequest, OperationKind, OperationType, OperationTypeId, Transfer,
    TransferId, TransferRequest, TransferStatus,
};
