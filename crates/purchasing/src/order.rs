use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use batchline_events::Event;
use batchline_parties::{PartyId, SupplierProfile};
use batchline_products::{PackInfo, ProductId};

use crate::lot_split::{self, LotAnnotation};

/// Purchase order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Approved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Domestic,
    DomesticSample,
    DomesticWillUpdate,
    Export,
    ExportSample,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCertificate {
    #[default]
    Required,
    NotRequired,
}

/// Receiving progress of a line or a whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptProgress {
    Pending,
    Closed,
}

impl core::fmt::Display for ReceiptProgress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReceiptProgress::Pending => f.write_str("Pending"),
            ReceiptProgress::Closed => f.write_str("Closed"),
        }
    }
}

/// What the MRP column of a printed order shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrpDisplay {
    Price(u64),
    Without,
    Sample,
    WillUpdate,
}

impl core::fmt::Display for MrpDisplay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MrpDisplay::Price(p) => write!(f, "{p}"),
            MrpDisplay::Without => f.write_str("Without"),
            MrpDisplay::Sample => f.write_str("Sample"),
            MrpDisplay::WillUpdate => f.write_str("Will Update"),
        }
    }
}

/// Logistics terms printed on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logistics {
    pub mode_of_transport: Option<String>,
    pub delivery_time_days: Option<u32>,
    pub place_of_delivery: Option<String>,
    pub inspection_by: String,
    pub test_certificate: TestCertificate,
}

impl Logistics {
    pub const DEFAULT_INSPECTION_BY: &'static str = "By us at our Premises";

    /// Terms pre-filled from the supplier's profile.
    pub fn from_supplier(profile: &SupplierProfile) -> Self {
        Self {
            mode_of_transport: profile.mode_of_transport.clone(),
            delivery_time_days: profile.delivery_time_days,
            place_of_delivery: profile.place_of_delivery.clone(),
            ..Self::default()
        }
    }
}

impl Default for Logistics {
    fn default() -> Self {
        Self {
            mode_of_transport: None,
            delivery_time_days: None,
            place_of_delivery: None,
            inspection_by: Self::DEFAULT_INSPECTION_BY.to_string(),
            test_certificate: TestCertificate::Required,
        }
    }
}

/// Quantity put away by one done receipt movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMove {
    pub lot: Option<String>,
    pub quantity: i64,
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    /// Price in smallest currency unit.
    pub unit_price: u64,
    /// Product list price at the time the line was added.
    pub mrp: u64,
    pub hsn_code: Option<String>,
    pub pack: PackInfo,
    pub received: Vec<ReceivedMove>,
}

impl LineItem {
    pub fn received_quantity(&self) -> i64 {
        self.received.iter().map(|m| m.quantity).sum()
    }

    /// Ordered minus received; negative when over-received.
    pub fn pending_quantity(&self) -> i64 {
        self.quantity - self.received_quantity()
    }

    pub fn status(&self) -> ReceiptProgress {
        if self.quantity == self.received_quantity() {
            ReceiptProgress::Closed
        } else {
            ReceiptProgress::Pending
        }
    }

    /// Distinct received lot names, sorted, comma separated.
    pub fn lot_numbers(&self) -> String {
        let mut names: Vec<&str> = self
            .received
            .iter()
            .filter_map(|m| m.lot.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.join(", ")
    }
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: Option<TenantId>,
    supplier_id: Option<PartyId>,
    order_type: OrderType,
    export_country: Option<String>,
    logistics: Logistics,
    status: PurchaseOrderStatus,
    lines: Vec<LineItem>,
    show_lot_wise: bool,
    lot_annotations: Vec<LotAnnotation>,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier_id: None,
            order_type: OrderType::Domestic,
            export_country: None,
            logistics: Logistics::default(),
            status: PurchaseOrderStatus::Draft,
            lines: Vec::new(),
            show_lot_wise: false,
            lot_annotations: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier_id(&self) -> Option<PartyId> {
        self.supplier_id
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn logistics(&self) -> &Logistics {
        &self.logistics
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn show_lot_wise(&self) -> bool {
        self.show_lot_wise
    }

    pub fn lot_annotations(&self) -> &[LotAnnotation] {
        &self.lot_annotations
    }

    /// Country name, only shown for plain export orders.
    pub fn export_country_label(&self) -> &str {
        match (self.order_type, self.export_country.as_deref()) {
            (OrderType::Export, Some(country)) => country,
            _ => "",
        }
    }

    /// `Closed` once every line is fully received; `Pending` otherwise,
    /// including when there are no lines at all.
    pub fn order_status(&self) -> ReceiptProgress {
        if self.lines.is_empty() || self.lines.iter().any(|l| l.pending_quantity() > 0) {
            ReceiptProgress::Pending
        } else {
            ReceiptProgress::Closed
        }
    }

    pub fn mrp_display(&self, line: &LineItem) -> MrpDisplay {
        match self.order_type {
            OrderType::Export => MrpDisplay::Without,
            OrderType::DomesticSample | OrderType::ExportSample => MrpDisplay::Sample,
            OrderType::DomesticWillUpdate => MrpDisplay::WillUpdate,
            OrderType::Domestic => MrpDisplay::Price(line.mrp),
        }
    }

    /// Whether any line carries a pack, which adds the pack column to the printout.
    pub fn has_packaging(&self) -> bool {
        self.lines.iter().any(|l| l.pack.has_pack())
    }

    /// Received quantity of one product across all lines.
    pub fn received_quantity_of(&self, product_id: ProductId) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(LineItem::received_quantity)
            .sum()
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchaseOrder.
///
/// Logistics terms default from `supplier_profile` when given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartyId,
    pub supplier_profile: Option<SupplierProfile>,
    pub order_type: OrderType,
    pub export_country: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLogistics (draft only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLogistics {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub logistics: Logistics,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Approve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approve {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine (only allowed in Draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub mrp: u64,
    pub hsn_code: Option<String>,
    pub pack: PackInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveGoods, one done receipt posted against a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveGoods {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub moves: Vec<ReceivedMove>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ToggleLotWise. Shows lot annotations when hidden, removes them when shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleLotWise {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchaseOrder(CreatePurchaseOrder),
    UpdateLogistics(UpdateLogistics),
    AddLine(AddLine),
    Approve(Approve),
    ReceiveGoods(ReceiveGoods),
    ToggleLotWise(ToggleLotWise),
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartyId,
    pub order_type: OrderType,
    pub export_country: Option<String>,
    pub logistics: Logistics,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LogisticsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsUpdated {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub logistics: Logistics,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderApproved {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineAdded {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceived {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub moves: Vec<ReceivedMove>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotSplitShown. Carries the full replacement set of annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSplitShown {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub annotations: Vec<LotAnnotation>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotSplitHidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSplitHidden {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    LogisticsUpdated(LogisticsUpdated),
    PurchaseOrderLineAdded(PurchaseOrderLineAdded),
    PurchaseOrderApproved(PurchaseOrderApproved),
    GoodsReceived(GoodsReceived),
    LotSplitShown(LotSplitShown),
    LotSplitHidden(LotSplitHidden),
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::LogisticsUpdated(_) => "purchasing.order.logistics_updated",
            PurchaseOrderEvent::PurchaseOrderLineAdded(_) => "purchasing.order.line_added",
            PurchaseOrderEvent::PurchaseOrderApproved(_) => "purchasing.order.approved",
            PurchaseOrderEvent::GoodsReceived(_) => "purchasing.order.goods_received",
            PurchaseOrderEvent::LotSplitShown(_) => "purchasing.order.lot_split_shown",
            PurchaseOrderEvent::LotSplitHidden(_) => "purchasing.order.lot_split_hidden",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::LogisticsUpdated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderApproved(e) => e.occurred_at,
            PurchaseOrderEvent::GoodsReceived(e) => e.occurred_at,
            PurchaseOrderEvent::LotSplitShown(e) => e.occurred_at,
            PurchaseOrderEvent::LotSplitHidden(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier_id = Some(e.supplier_id);
                self.order_type = e.order_type;
                self.export_country = e.export_country.clone();
                self.logistics = e.logistics.clone();
                self.status = PurchaseOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            PurchaseOrderEvent::LogisticsUpdated(e) => {
                self.logistics = e.logistics.clone();
            }
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            PurchaseOrderEvent::PurchaseOrderApproved(_) => {
                self.status = PurchaseOrderStatus::Approved;
            }
            PurchaseOrderEvent::GoodsReceived(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.received.extend(e.moves.iter().cloned());
                }
            }
            PurchaseOrderEvent::LotSplitShown(e) => {
                self.lot_annotations = e.annotations.clone();
                self.show_lot_wise = true;
            }
            PurchaseOrderEvent::LotSplitHidden(_) => {
                self.lot_annotations.clear();
                self.show_lot_wise = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchaseOrder(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::UpdateLogistics(cmd) => self.handle_logistics(cmd),
            PurchaseOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            PurchaseOrderCommand::Approve(cmd) => self.handle_approve(cmd),
            PurchaseOrderCommand::ReceiveGoods(cmd) => self.handle_receive(cmd),
            PurchaseOrderCommand::ToggleLotWise(cmd) => self.handle_toggle_lot_wise(cmd),
        }
    }
}

impl PurchaseOrder {
    fn ensure_existing(&self, tenant_id: TenantId, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), DomainError> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invariant(
                "cannot modify purchase order once approved",
            ));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }

        let logistics = cmd
            .supplier_profile
            .as_ref()
            .map(Logistics::from_supplier)
            .unwrap_or_default();

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCreated(
            PurchaseOrderCreated {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                supplier_id: cmd.supplier_id,
                order_type: cmd.order_type,
                export_country: cmd.export_country.clone(),
                logistics,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_logistics(&self, cmd: &UpdateLogistics) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.ensure_draft()?;

        Ok(vec![PurchaseOrderEvent::LogisticsUpdated(LogisticsUpdated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            logistics: cmd.logistics.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &Approve) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;

        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invariant(
                "only draft purchase orders can be approved",
            ));
        }

        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot approve purchase order without lines",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderApproved(
            PurchaseOrderApproved {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.ensure_draft()?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let next_line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        Ok(vec![PurchaseOrderEvent::PurchaseOrderLineAdded(
            PurchaseOrderLineAdded {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                line: LineItem {
                    line_no: next_line_no,
                    product_id: cmd.product_id,
                    description: cmd.description.clone(),
                    quantity: cmd.quantity,
                    unit_price: cmd.unit_price,
                    mrp: cmd.mrp,
                    hsn_code: cmd.hsn_code.clone(),
                    pack: cmd.pack.clone(),
                    received: Vec::new(),
                },
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_receive(&self, cmd: &ReceiveGoods) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;

        // Invariant: Cannot receive before approval.
        if self.status != PurchaseOrderStatus::Approved {
            return Err(DomainError::invariant(
                "cannot receive goods before purchase order is approved",
            ));
        }
        if self.line(cmd.line_no).is_none() {
            return Err(DomainError::validation(format!(
                "line {} does not exist",
                cmd.line_no
            )));
        }
        if cmd.moves.is_empty() {
            return Err(DomainError::validation("receipt carries no movements"));
        }
        if cmd.moves.iter().any(|m| m.quantity <= 0) {
            return Err(DomainError::validation("received quantity must be positive"));
        }

        Ok(vec![PurchaseOrderEvent::GoodsReceived(GoodsReceived {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line_no: cmd.line_no,
            moves: cmd.moves.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_toggle_lot_wise(
        &self,
        cmd: &ToggleLotWise,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;

        let event = if self.show_lot_wise {
            PurchaseOrderEvent::LotSplitHidden(LotSplitHidden {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            })
        } else {
            PurchaseOrderEvent::LotSplitShown(LotSplitShown {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                annotations: lot_split::split_by_lot(&self.lines),
                occurred_at: cmd.occurred_at,
            })
        };
        Ok(vec![event])
    }
}
