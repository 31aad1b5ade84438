//! Inspection workflow orchestration.
//!
//! The engine turns a finished receipt into an inspection report and moves
//! the sampled quantities receiving → quality check → retention through the
//! host ledger. Every operation works inside the caller's [`HostSession`];
//! the caller commits. A failed operation leaves the session in an undefined
//! state and it must be dropped, not committed.
//!
//! ```text
//! create_report      receipt ──► report (Pending)
//! begin_inspection   receipt destination ──samples──► Quality Check   (InProgress)
//! complete_inspection          Quality Check ──samples──► Retain Sample (Completed)
//! ```

use chrono::Utc;
use tracing::{debug, info, warn};

use batchline_core::{AggregateId, AggregateRoot, DomainError, ExpectedVersion, UserId};
use batchline_events::execute;
use batchline_inventory::inspection::{
    CompleteInspection, CreateReport, SetSampleQuantity, StartInspection,
};
use batchline_inventory::{
    InspectionCommand, InspectionLine, InspectionReport, InspectionReportId, InspectionSettings,
    InspectionStatus, Location, LocationId, LotRef, MovementRequest, NewInspectionLine,
    NewLocation, OperationType, Receipt, ReceiptId, SampleMovement, TransferId,
    TransferRequest,
};

use super::error::{InspectionError, InspectionResult};
use super::ports::{HostSession, LedgerError};
use super::receipt_lock::{ReceiptLockGuard, ReceiptLocks};

#[derive(Debug, Default)]
pub struct InspectionEngine {
    settings: InspectionSettings,
    receipt_locks: ReceiptLocks,
}

impl InspectionEngine {
    pub fn new(settings: InspectionSettings) -> Self {
        Self {
            settings,
            receipt_locks: ReceiptLocks::new(),
        }
    }

    pub fn settings(&self) -> &InspectionSettings {
        &self.settings
    }

    /// Serialize report creation for one receipt. Hold the guard until the
    /// session that used it has been committed.
    pub fn lock_receipt(&self, receipt_id: ReceiptId) -> ReceiptLockGuard<'_> {
        self.receipt_locks.lock(receipt_id)
    }

    /// Create a `Pending` report with one line per distinct received product.
    ///
    /// Does not check for an existing report; see [`Self::open_or_create_report`].
    pub fn create_report<S: HostSession>(
        &self,
        session: &mut S,
        receipt_id: ReceiptId,
        inspector: Option<UserId>,
    ) -> InspectionResult<InspectionReport> {
        let receipt = session
            .receipt(receipt_id)?
            .ok_or_else(|| InspectionError::invalid_receipt(receipt_id, "receipt does not exist"))?;
        if !receipt.is_finalized() {
            return Err(InspectionError::invalid_receipt(
                receipt_id,
                "receipt is not done yet",
            ));
        }
        let products = receipt.received_products();
        if products.is_empty() {
            return Err(InspectionError::invalid_receipt(
                receipt_id,
                "receipt has no received lines",
            ));
        }

        let reference = session.next_reference(&self.settings.report_sequence_code)?;
        let mut lines = Vec::with_capacity(products.len());
        for product in products {
            lines.push(NewInspectionLine {
                reference: session.next_reference(&self.settings.line_sequence_code)?,
                product_id: product.product_id,
                product_name: product.product_name,
                received_quantity: product.quantity,
                lot: product.lot,
            });
        }

        let tenant_id = session.tenant_id();
        let report_id = InspectionReportId::new(AggregateId::new());
        let mut report = InspectionReport::empty(report_id);
        Self::run(
            session,
            &mut report,
            InspectionCommand::CreateReport(CreateReport {
                tenant_id,
                report_id,
                reference,
                receipt_id,
                inspector,
                lines,
                occurred_at: Utc::now(),
            }),
        )?;

        info!(
            tenant_id = %tenant_id,
            report = %report.reference(),
            receipt = %receipt.reference,
            lines = report.lines().len(),
            "inspection report created"
        );
        Ok(report)
    }

    /// Existing report for the locked receipt, or a freshly created one.
    pub fn open_or_create_report<S: HostSession>(
        &self,
        session: &mut S,
        guard: &ReceiptLockGuard<'_>,
        inspector: Option<UserId>,
    ) -> InspectionResult<InspectionReport> {
        let receipt_id = guard.receipt_id();
        match session.find_report_for_receipt(session.tenant_id(), receipt_id)? {
            Some(report_id) => {
                debug!(receipt_id = %receipt_id, report_id = %report_id, "opening existing inspection report");
                Self::load(session, report_id)
            }
            None => self.create_report(session, receipt_id, inspector),
        }
    }

    pub fn has_inspection<S: HostSession>(
        &self,
        session: &S,
        receipt_id: ReceiptId,
    ) -> InspectionResult<bool> {
        Ok(session
            .find_report_for_receipt(session.tenant_id(), receipt_id)?
            .is_some())
    }

    pub fn report<S: HostSession>(
        &self,
        session: &S,
        report_id: InspectionReportId,
    ) -> InspectionResult<InspectionReport> {
        Self::load(session, report_id)
    }

    /// Apply a line-level edit (sample, details, checks, conclusion, removal).
    pub fn amend_report<S: HostSession>(
        &self,
        session: &mut S,
        command: InspectionCommand,
    ) -> InspectionResult<InspectionReport> {
        let report_id = match &command {
            InspectionCommand::SetSampleQuantity(c) => c.report_id,
            InspectionCommand::UpdateLineDetails(c) => c.report_id,
            InspectionCommand::RecordCheck(c) => c.report_id,
            InspectionCommand::RecordConclusion(c) => c.report_id,
            InspectionCommand::RemoveLine(c) => c.report_id,
            InspectionCommand::CreateReport(_)
            | InspectionCommand::StartInspection(_)
            | InspectionCommand::CompleteInspection(_) => {
                return Err(DomainError::validation(
                    "workflow commands are issued by the inspection engine only",
                )
                .into());
            }
        };

        let mut report = Self::load(session, report_id)?;
        Self::run(session, &mut report, command)?;
        Ok(report)
    }

    pub fn set_sample_quantity<S: HostSession>(
        &self,
        session: &mut S,
        report_id: InspectionReportId,
        line_no: u32,
        quantity: i64,
    ) -> InspectionResult<InspectionReport> {
        let tenant_id = session.tenant_id();
        self.amend_report(
            session,
            InspectionCommand::SetSampleQuantity(SetSampleQuantity {
                tenant_id,
                report_id,
                line_no,
                quantity,
                occurred_at: Utc::now(),
            }),
        )
    }

    /// Move every sample from the receipt destination into quality check and
    /// mark the report `InProgress`.
    pub fn begin_inspection<S: HostSession>(
        &self,
        session: &mut S,
        report_id: InspectionReportId,
    ) -> InspectionResult<InspectionReport> {
        let mut report = Self::load(session, report_id)?;
        report
            .status()
            .ensure_transition_to(InspectionStatus::InProgress)?;

        let receipt = Self::source_receipt(session, &report)?;
        let qc = self.find_or_create_child(
            session,
            receipt.destination,
            &self.settings.quality_check_location,
        )?;
        let operation_type = Self::internal_transfer_type(session)?;

        let transfer = session.create_transfer(TransferRequest {
            operation_type: operation_type.id,
            source: receipt.destination,
            destination: qc.id,
            origin: report.reference().to_string(),
            note: None,
        })?;

        let mut sample_movements = Vec::new();
        for line in report.sampled_lines() {
            let movement = session.add_movement(
                transfer.id,
                MovementRequest {
                    product_id: line.product_id,
                    quantity: line.sample(),
                    source: receipt.destination,
                    destination: qc.id,
                    lot: receipt.lot_for(line.product_id).cloned(),
                    description: format!("Sample Move for {}", line.product_name),
                    origin: report.reference().to_string(),
                },
            )?;
            sample_movements.push(SampleMovement {
                line_no: line.line_no,
                movement_id: movement.id,
            });
        }
        Self::post(session, transfer.id)?;

        let tenant_id = session.tenant_id();
        Self::run(
            session,
            &mut report,
            InspectionCommand::StartInspection(StartInspection {
                tenant_id,
                report_id,
                qc_transfer: transfer.id,
                sample_movements,
                occurred_at: Utc::now(),
            }),
        )?;

        info!(
            tenant_id = %tenant_id,
            report = %report.reference(),
            transfer_id = %transfer.id,
            "inspection started"
        );
        Ok(report)
    }

    /// Move every sample from quality check into retention and mark the report
    /// `Completed`. A report without lines completes without any transfer.
    pub fn complete_inspection<S: HostSession>(
        &self,
        session: &mut S,
        report_id: InspectionReportId,
    ) -> InspectionResult<InspectionReport> {
        let mut report = Self::load(session, report_id)?;
        report
            .status()
            .ensure_transition_to(InspectionStatus::Completed)?;
        let tenant_id = session.tenant_id();

        let retention_transfer = if report.lines().is_empty() {
            debug!(report = %report.reference(), "no lines to retain");
            None
        } else {
            Some(self.post_retention(session, &report)?)
        };

        Self::run(
            session,
            &mut report,
            InspectionCommand::CompleteInspection(CompleteInspection {
                tenant_id,
                report_id,
                retention_transfer,
                occurred_at: Utc::now(),
            }),
        )?;

        info!(
            tenant_id = %tenant_id,
            report = %report.reference(),
            "inspection completed"
        );
        Ok(report)
    }

    fn post_retention<S: HostSession>(
        &self,
        session: &mut S,
        report: &InspectionReport,
    ) -> InspectionResult<TransferId> {
        let receipt = Self::source_receipt(session, report)?;
        let qc_name = &self.settings.quality_check_location;
        let qc = session
            .find_child(receipt.destination, qc_name)?
            .ok_or_else(|| InspectionError::MissingQcLocation(qc_name.clone()))?;
        let retention = self.find_or_create_child(
            session,
            receipt.destination,
            &self.settings.retention_location,
        )?;
        let operation_type = Self::internal_transfer_type(session)?;

        let transfer = session.create_transfer(TransferRequest {
            operation_type: operation_type.id,
            source: qc.id,
            destination: retention.id,
            origin: report.reference().to_string(),
            note: None,
        })?;

        for line in report.sampled_lines() {
            let (source, lot) = Self::retained_sample_origin(session, report, &receipt, qc.id, line)?;
            session.add_movement(
                transfer.id,
                MovementRequest {
                    product_id: line.product_id,
                    quantity: line.sample(),
                    source,
                    destination: retention.id,
                    lot,
                    description: format!("Retain Sample Move for {}", line.product_name),
                    origin: report.reference().to_string(),
                },
            )?;
        }
        Self::post(session, transfer.id)?;
        Ok(transfer.id)
    }

    /// Where a line's sample sits now and which lot it carries.
    ///
    /// Samples moved at inspection start are in quality check with the lot of
    /// their QC movement. A sample recorded after the start never left the
    /// receiving location, so it is taken from there with the receipt's lot.
    fn retained_sample_origin<S: HostSession>(
        session: &S,
        report: &InspectionReport,
        receipt: &Receipt,
        qc: LocationId,
        line: &InspectionLine,
    ) -> InspectionResult<(LocationId, Option<LotRef>)> {
        match line.qc_movement {
            Some(movement_id) => {
                let movement = session.movement(movement_id)?.ok_or_else(|| {
                    LedgerError::NotFound(format!("quality check movement {movement_id}"))
                })?;
                Ok((qc, movement.lot))
            }
            None => {
                warn!(
                    report = %report.reference(),
                    line = %line.reference,
                    "sample recorded after inspection start; retaining from receipt location with receipt lot"
                );
                Ok((receipt.destination, receipt.lot_for(line.product_id).cloned()))
            }
        }
    }

    fn load<S: HostSession>(
        session: &S,
        report_id: InspectionReportId,
    ) -> InspectionResult<InspectionReport> {
        session
            .load_report(session.tenant_id(), report_id)?
            .ok_or(InspectionError::ReportNotFound(report_id))
    }

    /// Decide, apply and stage the resulting events in the session.
    fn run<S: HostSession>(
        session: &mut S,
        report: &mut InspectionReport,
        command: InspectionCommand,
    ) -> InspectionResult<()> {
        let tenant_id = session.tenant_id();
        let expected = ExpectedVersion::Exact(report.version());
        let events = execute(report, &command)?;
        session.append_report_events(tenant_id, report.id_typed(), expected, &events)?;
        Ok(())
    }

    fn source_receipt<S: HostSession>(
        session: &S,
        report: &InspectionReport,
    ) -> InspectionResult<Receipt> {
        let no_source = || InspectionError::NoSourceReceipt(report.id_typed());
        let receipt_id = report.receipt_id().ok_or_else(no_source)?;
        session.receipt(receipt_id)?.ok_or_else(no_source)
    }

    fn internal_transfer_type<S: HostSession>(session: &S) -> InspectionResult<OperationType> {
        session.internal_transfer_type()?.ok_or_else(|| {
            InspectionError::MissingConfiguration(
                "no internal transfer operation type is configured".to_string(),
            )
        })
    }

    fn find_or_create_child<S: HostSession>(
        &self,
        session: &mut S,
        parent: LocationId,
        name: &str,
    ) -> InspectionResult<Location> {
        if let Some(existing) = session.find_child(parent, name)? {
            return Ok(existing);
        }
        let created = session.create_location(NewLocation::internal_under(name, parent))?;
        info!(location = %name, location_id = %created.id, "created inspection location");
        Ok(created)
    }

    fn post<S: HostSession>(session: &mut S, transfer_id: TransferId) -> InspectionResult<()> {
        session.confirm(transfer_id)?;
        session.reserve(transfer_id)?;
        session.finalize(transfer_id)?;
        Ok(())
    }
}
