//! Single-process host: stock ledger, registries and report streams in memory.
//!
//! Each tenant has its own ledger. [`InMemoryHost::begin`] hands out a session
//! working on a private copy of that ledger; report events are staged in the
//! session. [`HostSession::commit`] swaps the copy in, appends the staged
//! events to the report streams and publishes them on the bus, or fails with
//! [`LedgerError::Conflict`] if anything committed in between.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};
use uuid::Uuid;

use batchline_core::{Aggregate, ExpectedVersion, TenantId};
use batchline_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use batchline_inventory::{
    InspectionEvent, InspectionReport, InspectionReportId, Location, LocationId, LotRef, Movement,
    MovementId, MovementRequest, NewLocation, OperationKind, OperationType, Receipt, ReceiptId,
    Transfer, TransferId, TransferRequest,
};
use batchline_products::ProductId;

use crate::event_store::{EventStore, EventStoreError, InMemoryEventStore, UncommittedEvent};
use crate::inspection::{
    HostSession, LedgerError, LedgerResult, LocationRegistry, MovementService,
    OperationTypeRegistry, ReceiptSource, ReportStore, SequenceGenerator,
};

use super::ledger::{LedgerState, QuantKey};

/// Aggregate type recorded on every inspection report stream.
pub const REPORT_AGGREGATE_TYPE: &str = "inventory.inspection";

pub type InspectionEnvelope = EventEnvelope<InspectionEvent>;

impl From<EventStoreError> for LedgerError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::Concurrency(msg) => LedgerError::Conflict(msg),
            other => LedgerError::PostingRejected(other.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct TenantLedger {
    ledger: LedgerState,
    version: u64,
}

#[derive(Debug)]
pub struct InMemoryHost {
    tenants: Mutex<HashMap<TenantId, TenantLedger>>,
    reports: InMemoryEventStore,
    bus: Arc<InMemoryEventBus<InspectionEnvelope>>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::with_bus(Arc::new(InMemoryEventBus::new()))
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus(bus: Arc<InMemoryEventBus<InspectionEnvelope>>) -> Self {
        Self {
            tenants: Mutex::new(HashMap::new()),
            reports: InMemoryEventStore::new(),
            bus,
        }
    }

    /// Committed report events, in commit order.
    pub fn subscribe(&self) -> Subscription<InspectionEnvelope> {
        self.bus.subscribe()
    }

    pub fn report_streams(&self) -> &InMemoryEventStore {
        &self.reports
    }

    /// Open a session on the tenant's current ledger.
    pub fn begin(&self, tenant_id: TenantId) -> LedgerResult<InMemorySession<'_>> {
        let mut tenants = self.lock()?;
        let entry = tenants.entry(tenant_id).or_default();
        Ok(InMemorySession {
            host: self,
            tenant_id,
            base_version: entry.version,
            ledger: entry.ledger.clone(),
            pending: Vec::new(),
            dirty: false,
        })
    }

    pub fn add_location(&self, tenant_id: TenantId, location: NewLocation) -> LedgerResult<Location> {
        self.write(tenant_id, |ledger| ledger.create_location(location))
    }

    pub fn add_operation_type(
        &self,
        tenant_id: TenantId,
        name: &str,
        kind: OperationKind,
    ) -> LedgerResult<OperationType> {
        self.write(tenant_id, |ledger| Ok(ledger.add_operation_type(name, kind)))
    }

    pub fn add_receipt(&self, tenant_id: TenantId, receipt: Receipt) -> LedgerResult<()> {
        self.write(tenant_id, |ledger| {
            if !ledger.locations.contains_key(&receipt.destination) {
                return Err(LedgerError::NotFound(format!(
                    "receipt destination {}",
                    receipt.destination
                )));
            }
            ledger.receipts.insert(receipt.id, receipt);
            Ok(())
        })
    }

    /// Overwrite the on-hand quantity of one stock bucket.
    pub fn set_stock(
        &self,
        tenant_id: TenantId,
        location: LocationId,
        product: ProductId,
        lot: Option<&LotRef>,
        quantity: i64,
    ) -> LedgerResult<()> {
        self.write(tenant_id, |ledger| {
            ledger.set_on_hand(QuantKey::new(location, product, lot), quantity);
            Ok(())
        })
    }

    pub fn on_hand(
        &self,
        tenant_id: TenantId,
        location: LocationId,
        product: ProductId,
        lot: Option<&LotRef>,
    ) -> LedgerResult<i64> {
        self.read(tenant_id, |ledger| {
            ledger.on_hand(&QuantKey::new(location, product, lot))
        })
    }

    pub fn transfers(&self, tenant_id: TenantId) -> LedgerResult<Vec<Transfer>> {
        self.read(tenant_id, |ledger| {
            ledger.transfers.values().cloned().collect()
        })
    }

    pub fn movements_of(
        &self,
        tenant_id: TenantId,
        transfer_id: TransferId,
    ) -> LedgerResult<Vec<Movement>> {
        self.read(tenant_id, |ledger| {
            ledger
                .transfers
                .get(&transfer_id)
                .map(|t| {
                    t.movements
                        .iter()
                        .filter_map(|id| ledger.movements.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub fn locations(&self, tenant_id: TenantId) -> LedgerResult<Vec<Location>> {
        self.read(tenant_id, |ledger| {
            ledger.locations.values().cloned().collect()
        })
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, HashMap<TenantId, TenantLedger>>> {
        self.tenants
            .lock()
            .map_err(|_| LedgerError::Conflict("host state lock poisoned".to_string()))
    }

    fn read<T>(&self, tenant_id: TenantId, f: impl FnOnce(&LedgerState) -> T) -> LedgerResult<T> {
        let tenants = self.lock()?;
        let empty = LedgerState::default();
        Ok(f(tenants.get(&tenant_id).map(|t| &t.ledger).unwrap_or(&empty)))
    }

    fn write<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&mut LedgerState) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut tenants = self.lock()?;
        let entry = tenants.entry(tenant_id).or_default();
        let out = f(&mut entry.ledger)?;
        entry.version += 1;
        Ok(out)
    }
}

#[derive(Debug)]
struct PendingStream {
    report_id: InspectionReportId,
    expected: ExpectedVersion,
    events: Vec<InspectionEvent>,
}

/// One transaction against an [`InMemoryHost`]. Dropping it discards its work.
#[derive(Debug)]
pub struct InMemorySession<'h> {
    host: &'h InMemoryHost,
    tenant_id: TenantId,
    base_version: u64,
    ledger: LedgerState,
    pending: Vec<PendingStream>,
    /// Set by every ledger write; a clean session commits as a no-op.
    dirty: bool,
}

impl InMemorySession<'_> {
    fn write<T>(&mut self, f: impl FnOnce(&mut LedgerState) -> LedgerResult<T>) -> LedgerResult<T> {
        self.dirty = true;
        f(&mut self.ledger)
    }

    fn committed_version(&self, report_id: InspectionReportId) -> LedgerResult<u64> {
        Ok(self.host.reports.stream_version(self.tenant_id, report_id.0)?)
    }

    fn pending_for(&self, report_id: InspectionReportId) -> Option<&PendingStream> {
        self.pending.iter().find(|p| p.report_id == report_id)
    }

    fn ensure_tenant(&self, tenant_id: TenantId) -> LedgerResult<()> {
        if tenant_id == self.tenant_id {
            Ok(())
        } else {
            Err(LedgerError::Conflict(format!(
                "session of tenant {} cannot access tenant {tenant_id}",
                self.tenant_id
            )))
        }
    }
}

impl ReceiptSource for InMemorySession<'_> {
    fn receipt(&self, id: ReceiptId) -> LedgerResult<Option<Receipt>> {
        Ok(self.ledger.receipts.get(&id).cloned())
    }
}

impl LocationRegistry for InMemorySession<'_> {
    fn location(&self, id: LocationId) -> LedgerResult<Option<Location>> {
        Ok(self.ledger.locations.get(&id).cloned())
    }

    fn find_child(&self, parent: LocationId, name: &str) -> LedgerResult<Option<Location>> {
        Ok(self.ledger.find_child(parent, name).cloned())
    }

    fn create_location(&mut self, location: NewLocation) -> LedgerResult<Location> {
        self.write(|ledger| ledger.create_location(location))
    }
}

impl OperationTypeRegistry for InMemorySession<'_> {
    fn internal_transfer_type(&self) -> LedgerResult<Option<OperationType>> {
        Ok(self.ledger.internal_transfer_type().cloned())
    }
}

impl MovementService for InMemorySession<'_> {
    fn create_transfer(&mut self, request: TransferRequest) -> LedgerResult<Transfer> {
        self.write(|ledger| ledger.create_transfer(request))
    }

    fn add_movement(
        &mut self,
        transfer_id: TransferId,
        request: MovementRequest,
    ) -> LedgerResult<Movement> {
        self.write(|ledger| ledger.add_movement(transfer_id, request))
    }

    fn confirm(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        self.write(|ledger| ledger.confirm(transfer_id))
    }

    fn reserve(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        self.write(|ledger| ledger.reserve(transfer_id))
    }

    fn finalize(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        self.write(|ledger| ledger.finalize(transfer_id))
    }

    fn transfer(&self, id: TransferId) -> LedgerResult<Option<Transfer>> {
        Ok(self.ledger.transfers.get(&id).cloned())
    }

    fn movement(&self, id: MovementId) -> LedgerResult<Option<Movement>> {
        Ok(self.ledger.movements.get(&id).cloned())
    }
}

impl SequenceGenerator for InMemorySession<'_> {
    fn next_reference(&mut self, code: &str) -> LedgerResult<String> {
        self.write(|ledger| Ok(ledger.next_reference(code)))
    }
}

impl ReportStore for InMemorySession<'_> {
    fn load_report(
        &self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
    ) -> LedgerResult<Option<InspectionReport>> {
        self.ensure_tenant(tenant_id)?;
        let mut events = self
            .host
            .reports
            .load_stream(tenant_id, report_id.0)?
            .iter()
            .map(|stored| stored.decode::<InspectionEvent>())
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(pending) = self.pending_for(report_id) {
            events.extend(pending.events.iter().cloned());
        }
        if events.is_empty() {
            return Ok(None);
        }

        let mut report = InspectionReport::empty(report_id);
        report.replay(events.iter());
        Ok(Some(report))
    }

    fn find_report_for_receipt(
        &self,
        tenant_id: TenantId,
        receipt_id: ReceiptId,
    ) -> LedgerResult<Option<InspectionReportId>> {
        self.ensure_tenant(tenant_id)?;
        Ok(self.ledger.reports_by_receipt.get(&receipt_id).copied())
    }

    fn append_report_events(
        &mut self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
        expected: ExpectedVersion,
        events: &[InspectionEvent],
    ) -> LedgerResult<()> {
        self.ensure_tenant(tenant_id)?;
        let staged = self.pending_for(report_id).map_or(0, |p| p.events.len() as u64);
        let current = self.committed_version(report_id)? + staged;
        if !expected.matches(current) {
            return Err(LedgerError::Conflict(format!(
                "report {report_id}: expected {expected:?}, found {current}"
            )));
        }

        self.dirty = true;
        for event in events {
            if let InspectionEvent::ReportCreated(created) = event {
                self.ledger
                    .reports_by_receipt
                    .insert(created.receipt_id, report_id);
            }
        }

        match self.pending.iter_mut().find(|p| p.report_id == report_id) {
            Some(pending) => pending.events.extend(events.iter().cloned()),
            None => self.pending.push(PendingStream {
                report_id,
                expected: ExpectedVersion::Exact(current),
                events: events.to_vec(),
            }),
        }
        Ok(())
    }
}

impl HostSession for InMemorySession<'_> {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn commit(self) -> LedgerResult<()> {
        let Self {
            host,
            tenant_id,
            base_version,
            ledger,
            pending,
            dirty,
        } = self;
        if !dirty && pending.is_empty() {
            debug!(tenant_id = %tenant_id, "read-only host session, nothing to commit");
            return Ok(());
        }

        let mut batches = Vec::with_capacity(pending.len());
        for stream in &pending {
            let batch = stream
                .events
                .iter()
                .map(|event| {
                    UncommittedEvent::from_typed(
                        tenant_id,
                        stream.report_id.0,
                        REPORT_AGGREGATE_TYPE,
                        Uuid::now_v7(),
                        event,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            batches.push((stream.expected, batch));
        }

        let stored = {
            let mut tenants = host.lock()?;
            let entry = tenants.entry(tenant_id).or_default();
            if entry.version != base_version {
                warn!(
                    tenant_id = %tenant_id,
                    expected = base_version,
                    found = entry.version,
                    "host session conflict"
                );
                return Err(LedgerError::Conflict(format!(
                    "tenant {tenant_id} ledger changed since the session began"
                )));
            }
            for stream in &pending {
                let current = host.reports.stream_version(tenant_id, stream.report_id.0)?;
                if !stream.expected.matches(current) {
                    return Err(LedgerError::Conflict(format!(
                        "report {} changed since the session began",
                        stream.report_id
                    )));
                }
            }

            let mut stored = Vec::new();
            for (expected, batch) in batches {
                stored.extend(host.reports.append(batch, expected)?);
            }
            entry.ledger = ledger;
            entry.version += 1;
            stored
        };

        debug!(
            tenant_id = %tenant_id,
            events = stored.len(),
            "host session committed"
        );

        for event in &stored {
            match event.to_envelope::<InspectionEvent>() {
                Ok(envelope) => {
                    if let Err(err) = host.bus.publish(envelope) {
                        warn!(event_id = %event.event_id, error = ?err, "failed to publish inspection event");
                    }
                }
                Err(err) => {
                    warn!(event_id = %event.event_id, error = %err, "failed to decode committed event");
                }
            }
        }
        Ok(())
    }
}
