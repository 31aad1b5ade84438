//! Collaborator contracts the inspection engine is driven through.
//!
//! Every call goes through one [`HostSession`]: a transaction-scoped handle
//! over the host's stock ledger, registries and report storage. Nothing the
//! engine does through a session becomes visible to others until the caller
//! commits it; dropping a session discards its work.

use thiserror::Error;

use batchline_core::{ExpectedVersion, TenantId};
use batchline_inventory::{
    InspectionEvent, InspectionReport, InspectionReportId, Location, LocationId, Movement,
    MovementId, MovementRequest, NewLocation, OperationType, Receipt, ReceiptId, Transfer,
    TransferId, TransferRequest,
};
use batchline_products::ProductId;

/// Failures reported by the host ledger and its registries.
///
/// The engine never retries or compensates; these reach the caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("reservation failed: {0}")]
    ReservationFailed(String),

    #[error(
        "insufficient stock of product {product} at location {location}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: ProductId,
        location: LocationId,
        requested: i64,
        available: i64,
    },

    #[error("posting rejected: {0}")]
    PostingRejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent modification detected at commit or append time.
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

pub trait ReceiptSource {
    fn receipt(&self, id: ReceiptId) -> LedgerResult<Option<Receipt>>;
}

pub trait LocationRegistry {
    fn location(&self, id: LocationId) -> LedgerResult<Option<Location>>;

    /// Child of `parent` with exactly this name.
    fn find_child(&self, parent: LocationId, name: &str) -> LedgerResult<Option<Location>>;

    fn create_location(&mut self, location: NewLocation) -> LedgerResult<Location>;
}

pub trait OperationTypeRegistry {
    /// The generic internal transfer type, if the host has one configured.
    fn internal_transfer_type(&self) -> LedgerResult<Option<OperationType>>;
}

/// Transfer lifecycle: create → add movements → confirm → reserve → finalize.
pub trait MovementService {
    fn create_transfer(&mut self, request: TransferRequest) -> LedgerResult<Transfer>;

    fn add_movement(
        &mut self,
        transfer_id: TransferId,
        request: MovementRequest,
    ) -> LedgerResult<Movement>;

    fn confirm(&mut self, transfer_id: TransferId) -> LedgerResult<()>;

    /// Reserve stock at the source location for every movement.
    fn reserve(&mut self, transfer_id: TransferId) -> LedgerResult<()>;

    /// Post the transfer; stock leaves the source and lands at the destination.
    fn finalize(&mut self, transfer_id: TransferId) -> LedgerResult<()>;

    fn transfer(&self, id: TransferId) -> LedgerResult<Option<Transfer>>;

    fn movement(&self, id: MovementId) -> LedgerResult<Option<Movement>>;
}

pub trait SequenceGenerator {
    /// Next unique reference for a sequence code. Format is host-defined.
    fn next_reference(&mut self, code: &str) -> LedgerResult<String>;
}

/// Event-sourced persistence of inspection reports.
pub trait ReportStore {
    /// Rehydrated report, `None` when the stream is empty.
    fn load_report(
        &self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
    ) -> LedgerResult<Option<InspectionReport>>;

    fn find_report_for_receipt(
        &self,
        tenant_id: TenantId,
        receipt_id: ReceiptId,
    ) -> LedgerResult<Option<InspectionReportId>>;

    fn append_report_events(
        &mut self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
        expected: ExpectedVersion,
        events: &[InspectionEvent],
    ) -> LedgerResult<()>;
}

/// One transaction against the host.
pub trait HostSession:
    ReceiptSource
    + LocationRegistry
    + OperationTypeRegistry
    + MovementService
    + SequenceGenerator
    + ReportStore
{
    fn tenant_id(&self) -> TenantId;

    /// Make everything done through this session visible atomically.
    fn commit(self) -> LedgerResult<()>
    where
        Self: Sized;
}
