use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, UserId};
use batchline_events::Event;
use batchline_products::ProductId;

use super::line::{CheckItem, CheckResult, Conclusion, InspectionLine, LineDetails};
use super::status::InspectionStatus;
use crate::lot::LotRef;
use crate::receipt::ReceiptId;
use crate::transfer::{MovementId, TransferId};

/// Inspection report identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionReportId(pub AggregateId);

impl InspectionReportId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InspectionReportId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: InspectionReport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionReport {
    id: InspectionReportId,
    tenant_id: Option<TenantId>,
    reference: String,
    receipt_id: Option<ReceiptId>,
    inspected_at: Option<DateTime<Utc>>,
    inspector: Option<UserId>,
    status: InspectionStatus,
    lines: Vec<InspectionLine>,
    qc_transfer: Option<TransferId>,
    retention_transfer: Option<TransferId>,
    version: u64,
    created: bool,
}

impl InspectionReport {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InspectionReportId) -> Self {
        Self {
            id,
            tenant_id: None,
            reference: String::new(),
            receipt_id: None,
            inspected_at: None,
            inspector: None,
            status: InspectionStatus::Pending,
            lines: Vec::new(),
            qc_transfer: None,
            retention_transfer: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InspectionReportId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn receipt_id(&self) -> Option<ReceiptId> {
        self.receipt_id
    }

    pub fn inspected_at(&self) -> Option<DateTime<Utc>> {
        self.inspected_at
    }

    pub fn inspector(&self) -> Option<UserId> {
        self.inspector
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn lines(&self) -> &[InspectionLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&InspectionLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    /// Lines whose sample has to be physically moved.
    pub fn sampled_lines(&self) -> impl Iterator<Item = &InspectionLine> {
        self.lines.iter().filter(|l| l.has_sample())
    }

    pub fn qc_transfer(&self) -> Option<TransferId> {
        self.qc_transfer
    }

    pub fn retention_transfer(&self) -> Option<TransferId> {
        self.retention_transfer
    }
}

impl AggregateRoot for InspectionReport {
    type Id = InspectionReportId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Line content captured from the receipt when the report is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInspectionLine {
    pub reference: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub received_quantity: i64,
    pub lot: Option<LotRef>,
}

/// Link between an inspection line and the QC movement created for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMovement {
    pub line_no: u32,
    pub movement_id: MovementId,
}

/// Command: CreateReport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReport {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub reference: String,
    pub receipt_id: ReceiptId,
    pub inspector: Option<UserId>,
    pub lines: Vec<NewInspectionLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSampleQuantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSampleQuantity {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLineDetails (replaces the line's descriptive data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLineDetails {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub details: LineDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordCheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCheck {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub item: CheckItem,
    pub result: CheckResult,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordConclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConclusion {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub conclusion: Option<Conclusion>,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLine (pending reports only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartInspection.
///
/// Issued once the sample transfer into quality check has been posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartInspection {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub qc_transfer: TransferId,
    pub sample_movements: Vec<SampleMovement>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteInspection.
///
/// `retention_transfer` is the posted QC → retention transfer; it is absent
/// exactly when the report has no lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteInspection {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub retention_transfer: Option<TransferId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionCommand {
    CreateReport(CreateReport),
    SetSampleQuantity(SetSampleQuantity),
    UpdateLineDetails(UpdateLineDetails),
    RecordCheck(RecordCheck),
    RecordConclusion(RecordConclusion),
    RemoveLine(RemoveLine),
    StartInspection(StartInspection),
    CompleteInspection(CompleteInspection),
}

/// Event: ReportCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCreated {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub reference: String,
    pub receipt_id: ReceiptId,
    pub inspector: Option<UserId>,
    pub lines: Vec<NewInspectionLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SampleQuantitySet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleQuantitySet {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDetailsUpdated {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub details: LineDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecorded {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub item: CheckItem,
    pub result: CheckResult,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConclusionRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionRecorded {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub conclusion: Option<Conclusion>,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InspectionStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionStarted {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub qc_transfer: TransferId,
    pub sample_movements: Vec<SampleMovement>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InspectionCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionCompleted {
    pub tenant_id: TenantId,
    pub report_id: InspectionReportId,
    pub retention_transfer: Option<TransferId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionEvent {
    ReportCreated(ReportCreated),
    SampleQuantitySet(SampleQuantitySet),
    LineDetailsUpdated(LineDetailsUpdated),
    CheckRecorded(CheckRecorded),
    ConclusionRecorded(ConclusionRecorded),
    LineRemoved(LineRemoved),
    InspectionStarted(InspectionStarted),
    InspectionCompleted(InspectionCompleted),
}

impl InspectionEvent {
    pub fn report_id(&self) -> InspectionReportId {
        match self {
            InspectionEvent::ReportCreated(e) => e.report_id,
            InspectionEvent::SampleQuantitySet(e) => e.report_id,
            InspectionEvent::LineDetailsUpdated(e) => e.report_id,
            InspectionEvent::CheckRecorded(e) => e.report_id,
            InspectionEvent::ConclusionRecorded(e) => e.report_id,
            InspectionEvent::LineRemoved(e) => e.report_id,
            InspectionEvent::InspectionStarted(e) => e.report_id,
            InspectionEvent::InspectionCompleted(e) => e.report_id,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        match self {
            InspectionEvent::ReportCreated(e) => e.tenant_id,
            InspectionEvent::SampleQuantitySet(e) => e.tenant_id,
            InspectionEvent::LineDetailsUpdated(e) => e.tenant_id,
            InspectionEvent::CheckRecorded(e) => e.tenant_id,
            InspectionEvent::ConclusionRecorded(e) => e.tenant_id,
            InspectionEvent::LineRemoved(e) => e.tenant_id,
            InspectionEvent::InspectionStarted(e) => e.tenant_id,
            InspectionEvent::InspectionCompleted(e) => e.tenant_id,
        }
    }
}

impl Event for InspectionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InspectionEvent::ReportCreated(_) => "inventory.inspection.created",
            InspectionEvent::SampleQuantitySet(_) => "inventory.inspection.sample_set",
            InspectionEvent::LineDetailsUpdated(_) => "inventory.inspection.line_details_updated",
            InspectionEvent::CheckRecorded(_) => "inventory.inspection.check_recorded",
            InspectionEvent::ConclusionRecorded(_) => "inventory.inspection.conclusion_recorded",
            InspectionEvent::LineRemoved(_) => "inventory.inspection.line_removed",
            InspectionEvent::InspectionStarted(_) => "inventory.inspection.started",
            InspectionEvent::InspectionCompleted(_) => "inventory.inspection.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InspectionEvent::ReportCreated(e) => e.occurred_at,
            InspectionEvent::SampleQuantitySet(e) => e.occurred_at,
            InspectionEvent::LineDetailsUpdated(e) => e.occurred_at,
            InspectionEvent::CheckRecorded(e) => e.occurred_at,
            InspectionEvent::ConclusionRecorded(e) => e.occurred_at,
            InspectionEvent::LineRemoved(e) => e.occurred_at,
            InspectionEvent::InspectionStarted(e) => e.occurred_at,
            InspectionEvent::InspectionCompleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InspectionReport {
    type Command = InspectionCommand;
    type Event = InspectionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InspectionEvent::ReportCreated(e) => {
                self.id = e.report_id;
                self.tenant_id = Some(e.tenant_id);
                self.reference = e.reference.clone();
                self.receipt_id = Some(e.receipt_id);
                self.inspected_at = Some(e.occurred_at);
                self.inspector = e.inspector;
                self.status = InspectionStatus::Pending;
                self.lines = e
                    .lines
                    .iter()
                    .zip(1u32..)
                    .map(|(l, line_no)| InspectionLine {
                        line_no,
                        reference: l.reference.clone(),
                        product_id: l.product_id,
                        product_name: l.product_name.clone(),
                        received_quantity: l.received_quantity,
                        sample_quantity: None,
                        lot: l.lot.clone(),
                        details: LineDetails::default(),
                        checks: BTreeMap::new(),
                        conclusion: None,
                        remarks: None,
                        qc_movement: None,
                    })
                    .collect();
                self.created = true;
            }
            InspectionEvent::SampleQuantitySet(e) => {
                if let Some(line) = self.line_mut(e.line_no) {
                    line.sample_quantity = Some(e.quantity);
                }
            }
            InspectionEvent::LineDetailsUpdated(e) => {
                if let Some(line) = self.line_mut(e.line_no) {
                    line.details = e.details.clone();
                }
            }
            InspectionEvent::CheckRecorded(e) => {
                if let Some(line) = self.line_mut(e.line_no) {
                    line.checks.insert(e.item, e.result.clone());
                }
            }
            InspectionEvent::ConclusionRecorded(e) => {
                if let Some(line) = self.line_mut(e.line_no) {
                    line.conclusion = e.conclusion;
                    line.remarks = e.remarks.clone();
                }
            }
            InspectionEvent::LineRemoved(e) => {
                self.lines.retain(|l| l.line_no != e.line_no);
            }
            InspectionEvent::InspectionStarted(e) => {
                for link in &e.sample_movements {
                    if let Some(line) = self.line_mut(link.line_no) {
                        line.qc_movement = Some(link.movement_id);
                    }
                }
                self.qc_transfer = Some(e.qc_transfer);
                self.status = InspectionStatus::InProgress;
            }
            InspectionEvent::InspectionCompleted(e) => {
                self.retention_transfer = e.retention_transfer;
                self.status = InspectionStatus::Completed;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InspectionCommand::CreateReport(cmd) => self.handle_create(cmd),
            InspectionCommand::SetSampleQuantity(cmd) => self.handle_set_sample(cmd),
            InspectionCommand::UpdateLineDetails(cmd) => self.handle_line_details(cmd),
            InspectionCommand::RecordCheck(cmd) => self.handle_record_check(cmd),
            InspectionCommand::RecordConclusion(cmd) => self.handle_conclusion(cmd),
            InspectionCommand::RemoveLine(cmd) => self.handle_remove_line(cmd),
            InspectionCommand::StartInspection(cmd) => self.handle_start(cmd),
            InspectionCommand::CompleteInspection(cmd) => self.handle_complete(cmd),
        }
    }
}

impl InspectionReport {
    fn line_mut(&mut self, line_no: u32) -> Option<&mut InspectionLine> {
        self.lines.iter_mut().find(|l| l.line_no == line_no)
    }

    fn ensure_existing(
        &self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
    ) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != report_id {
            return Err(DomainError::invariant("report_id mismatch"));
        }
        Ok(())
    }

    /// Existing line on a report that still accepts edits.
    fn editable_line(
        &self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
        line_no: u32,
    ) -> Result<&InspectionLine, DomainError> {
        self.ensure_existing(tenant_id, report_id)?;
        if !self.status.lines_editable() {
            return Err(DomainError::invalid_transition(format!(
                "inspection report {} is completed and read-only",
                self.reference
            )));
        }
        self.line(line_no).ok_or_else(|| {
            DomainError::validation(format!(
                "line {line_no} does not exist on report {}",
                self.reference
            ))
        })
    }

    fn handle_create(&self, cmd: &CreateReport) -> Result<Vec<InspectionEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("inspection report already exists"));
        }
        if cmd.reference.trim().is_empty() {
            return Err(DomainError::validation("report reference cannot be empty"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "inspection report needs at least one line",
            ));
        }

        let mut products = HashSet::new();
        for line in &cmd.lines {
            if !products.insert(line.product_id) {
                return Err(DomainError::validation(format!(
                    "product {} appears on more than one line",
                    line.product_name
                )));
            }
            if line.received_quantity < 0 {
                return Err(DomainError::validation(
                    "received quantity cannot be negative",
                ));
            }
        }

        Ok(vec![InspectionEvent::ReportCreated(ReportCreated {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            reference: cmd.reference.clone(),
            receipt_id: cmd.receipt_id,
            inspector: cmd.inspector,
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_sample(
        &self,
        cmd: &SetSampleQuantity,
    ) -> Result<Vec<InspectionEvent>, DomainError> {
        let line = self.editable_line(cmd.tenant_id, cmd.report_id, cmd.line_no)?;

        if line.is_sample_locked() {
            return Err(DomainError::locked(format!(
                "sample quantity of line {} is already recorded",
                line.reference
            )));
        }
        if cmd.quantity < 0 {
            return Err(DomainError::validation("sample quantity cannot be negative"));
        }
        if cmd.quantity > line.received_quantity {
            return Err(DomainError::validation(format!(
                "sample quantity {} exceeds received quantity {}",
                cmd.quantity, line.received_quantity
            )));
        }

        Ok(vec![InspectionEvent::SampleQuantitySet(SampleQuantitySet {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            line_no: cmd.line_no,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_line_details(
        &self,
        cmd: &UpdateLineDetails,
    ) -> Result<Vec<InspectionEvent>, DomainError> {
        self.editable_line(cmd.tenant_id, cmd.report_id, cmd.line_no)?;
        cmd.details.validate()?;

        Ok(vec![InspectionEvent::LineDetailsUpdated(LineDetailsUpdated {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            line_no: cmd.line_no,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_check(&self, cmd: &RecordCheck) -> Result<Vec<InspectionEvent>, DomainError> {
        self.editable_line(cmd.tenant_id, cmd.report_id, cmd.line_no)?;
        cmd.result.validate(cmd.item)?;

        Ok(vec![InspectionEvent::CheckRecorded(CheckRecorded {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            line_no: cmd.line_no,
            item: cmd.item,
            result: cmd.result.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_conclusion(
        &self,
        cmd: &RecordConclusion,
    ) -> Result<Vec<InspectionEvent>, DomainError> {
        self.editable_line(cmd.tenant_id, cmd.report_id, cmd.line_no)?;

        Ok(vec![InspectionEvent::ConclusionRecorded(ConclusionRecorded {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            line_no: cmd.line_no,
            conclusion: cmd.conclusion,
            remarks: cmd.remarks.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(&self, cmd: &RemoveLine) -> Result<Vec<InspectionEvent>, DomainError> {
        self.editable_line(cmd.tenant_id, cmd.report_id, cmd.line_no)?;
        if self.status != InspectionStatus::Pending {
            return Err(DomainError::invalid_transition(
                "lines can only be removed while the report is pending",
            ));
        }

        Ok(vec![InspectionEvent::LineRemoved(LineRemoved {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            line_no: cmd.line_no,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start(&self, cmd: &StartInspection) -> Result<Vec<InspectionEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.report_id)?;
        self.status
            .ensure_transition_to(InspectionStatus::InProgress)?;

        // Exactly one movement per sampled line, none for the others.
        let mut linked = HashSet::new();
        for link in &cmd.sample_movements {
            let line = self.line(link.line_no).ok_or_else(|| {
                DomainError::invariant(format!("movement linked to unknown line {}", link.line_no))
            })?;
            if !line.has_sample() {
                return Err(DomainError::invariant(format!(
                    "line {} has no sample but a movement was linked",
                    line.reference
                )));
            }
            if !linked.insert(link.line_no) {
                return Err(DomainError::invariant(format!(
                    "line {} linked to more than one movement",
                    line.reference
                )));
            }
        }
        if let Some(missing) = self.sampled_lines().find(|l| !linked.contains(&l.line_no)) {
            return Err(DomainError::invariant(format!(
                "sampled line {} has no movement",
                missing.reference
            )));
        }

        Ok(vec![InspectionEvent::InspectionStarted(InspectionStarted {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            qc_transfer: cmd.qc_transfer,
            sample_movements: cmd.sample_movements.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(
        &self,
        cmd: &CompleteInspection,
    ) -> Result<Vec<InspectionEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.report_id)?;
        self.status
            .ensure_transition_to(InspectionStatus::Completed)?;

        match (self.lines.is_empty(), cmd.retention_transfer) {
            (true, Some(_)) => {
                return Err(DomainError::invariant(
                    "a report without lines has nothing to retain",
                ));
            }
            (false, None) => {
                return Err(DomainError::invariant(
                    "completing a report with lines requires a retention transfer",
                ));
            }
            _ => {}
        }

        Ok(vec![InspectionEvent::InspectionCompleted(InspectionCompleted {
            tenant_id: cmd.tenant_id,
            report_id: cmd.report_id,
            retention_transfer: cmd.retention_transfer,
            occurred_at: cmd.occurred_at,
        })])
    }
}
