//! Vendor bills and merging purchase-order matches into a bill line.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, TenantId};
use batchline_events::Event;
use batchline_parties::PartyId;
use batchline_products::ProductId;

use crate::order::PurchaseOrderId;

/// Vendor bill identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorBillId(pub AggregateId);

impl VendorBillId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VendorBillId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Draft,
    Posted,
}

/// Purchase order line a bill line is reconciled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseLineRef {
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    /// Price in the bill currency, smallest unit.
    pub unit_price: u64,
    pub uom: String,
    pub purchase_line: Option<PurchaseLineRef>,
    pub account: String,
    pub taxes: Vec<String>,
}

/// A not-yet-billed purchase quantity offered for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseMatch {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub uom: String,
    pub currency: String,
    pub purchase_line: Option<PurchaseLineRef>,
}

/// Converts amounts between currencies at a given date.
pub trait CurrencyConverter {
    fn convert(&self, amount: u64, from: &str, to: &str, on: NaiveDate) -> DomainResult<u64>;
}

/// A match whose price has been expressed in the bill currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedMatch {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub uom: String,
    pub purchase_line: Option<PurchaseLineRef>,
}

/// Aggregate root: VendorBill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorBill {
    id: VendorBillId,
    tenant_id: Option<TenantId>,
    supplier_id: Option<PartyId>,
    currency: String,
    bill_date: Option<NaiveDate>,
    status: BillStatus,
    lines: Vec<BillLine>,
    version: u64,
    created: bool,
}

impl VendorBill {
    pub fn empty(id: VendorBillId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier_id: None,
            currency: String::new(),
            bill_date: None,
            status: BillStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier_id(&self) -> Option<PartyId> {
        self.supplier_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn lines(&self) -> &[BillLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&BillLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    /// Untaxed total in the bill currency.
    pub fn total_untaxed(&self) -> DomainResult<i64> {
        self.lines.iter().try_fold(0i64, |total, l| {
            i64::try_from(l.unit_price)
                .ok()
                .and_then(|price| l.quantity.checked_mul(price))
                .and_then(|amount| total.checked_add(amount))
                .ok_or_else(|| {
                    DomainError::validation(format!("bill line {} amount overflows", l.line_no))
                })
        })
    }

    /// Build the merge command for `matches`, converting match prices into
    /// the bill currency at the bill date.
    pub fn merge_command(
        &self,
        tenant_id: TenantId,
        target_line_no: u32,
        matches: &[PurchaseMatch],
        converter: &dyn CurrencyConverter,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<MergePurchaseMatches> {
        let on = self
            .bill_date
            .unwrap_or_else(|| occurred_at.date_naive());
        let priced = matches
            .iter()
            .map(|m| {
                let unit_price = if m.currency == self.currency {
                    m.unit_price
                } else {
                    converter.convert(m.unit_price, &m.currency, &self.currency, on)?
                };
                Ok(PricedMatch {
                    product_id: m.product_id,
                    description: m.description.clone(),
                    quantity: m.quantity,
                    unit_price,
                    uom: m.uom.clone(),
                    purchase_line: m.purchase_line,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(MergePurchaseMatches {
            tenant_id,
            bill_id: self.id,
            target_line_no,
            matches: priced,
            occurred_at,
        })
    }
}

impl AggregateRoot for VendorBill {
    type Id = VendorBillId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBill {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub supplier_id: PartyId,
    pub currency: String,
    pub bill_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBillLine {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub uom: String,
    pub account: String,
    pub taxes: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MergePurchaseMatches.
///
/// The first match overwrites the target line; every further match becomes a
/// new line booked on the target's account and taxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePurchaseMatches {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub target_line_no: u32,
    pub matches: Vec<PricedMatch>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBill {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorBillCommand {
    CreateBill(CreateBill),
    AddBillLine(AddBillLine),
    MergePurchaseMatches(MergePurchaseMatches),
    PostBill(PostBill),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCreated {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub supplier_id: PartyId,
    pub currency: String,
    pub bill_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLineAdded {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub line: BillLine,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseMatchesMerged {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    /// Target line after overwrite.
    pub updated: BillLine,
    pub appended: Vec<BillLine>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPosted {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorBillEvent {
    BillCreated(BillCreated),
    BillLineAdded(BillLineAdded),
    PurchaseMatchesMerged(PurchaseMatchesMerged),
    BillPosted(BillPosted),
}

impl Event for VendorBillEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VendorBillEvent::BillCreated(_) => "purchasing.bill.created",
            VendorBillEvent::BillLineAdded(_) => "purchasing.bill.line_added",
            VendorBillEvent::PurchaseMatchesMerged(_) => "purchasing.bill.matches_merged",
            VendorBillEvent::BillPosted(_) => "purchasing.bill.posted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            VendorBillEvent::BillCreated(e) => e.occurred_at,
            VendorBillEvent::BillLineAdded(e) => e.occurred_at,
            VendorBillEvent::PurchaseMatchesMerged(e) => e.occurred_at,
            VendorBillEvent::BillPosted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for VendorBill {
    type Command = VendorBillCommand;
    type Event = VendorBillEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            VendorBillEvent::BillCreated(e) => {
                self.id = e.bill_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier_id = Some(e.supplier_id);
                self.currency = e.currency.clone();
                self.bill_date = e.bill_date;
                self.status = BillStatus::Draft;
                self.created = true;
            }
            VendorBillEvent::BillLineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            VendorBillEvent::PurchaseMatchesMerged(e) => {
                if let Some(target) = self
                    .lines
                    .iter_mut()
                    .find(|l| l.line_no == e.updated.line_no)
                {
                    *target = e.updated.clone();
                }
                self.lines.extend(e.appended.iter().cloned());
            }
            VendorBillEvent::BillPosted(_) => {
                self.status = BillStatus::Posted;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            VendorBillCommand::CreateBill(cmd) => self.handle_create(cmd),
            VendorBillCommand::AddBillLine(cmd) => self.handle_add_line(cmd),
            VendorBillCommand::MergePurchaseMatches(cmd) => self.handle_merge(cmd),
            VendorBillCommand::PostBill(cmd) => self.handle_post(cmd),
        }
    }
}

impl VendorBill {
    fn ensure_draft(&self, tenant_id: TenantId, bill_id: VendorBillId) -> DomainResult<()> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != bill_id {
            return Err(DomainError::invariant("bill_id mismatch"));
        }
        if self.status != BillStatus::Draft {
            return Err(DomainError::invalid_transition(
                "operation only applies to draft bills",
            ));
        }
        Ok(())
    }

    fn next_line_no(&self) -> u32 {
        self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1
    }

    fn handle_create(&self, cmd: &CreateBill) -> DomainResult<Vec<VendorBillEvent>> {
        if self.created {
            return Err(DomainError::conflict("vendor bill already exists"));
        }
        if cmd.currency.trim().is_empty() {
            return Err(DomainError::validation("bill currency is required"));
        }

        Ok(vec![VendorBillEvent::BillCreated(BillCreated {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            supplier_id: cmd.supplier_id,
            currency: cmd.currency.clone(),
            bill_date: cmd.bill_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddBillLine) -> DomainResult<Vec<VendorBillEvent>> {
        self.ensure_draft(cmd.tenant_id, cmd.bill_id)?;
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        Ok(vec![VendorBillEvent::BillLineAdded(BillLineAdded {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            line: BillLine {
                line_no: self.next_line_no(),
                product_id: cmd.product_id,
                description: cmd.description.clone(),
                quantity: cmd.quantity,
                unit_price: cmd.unit_price,
                uom: cmd.uom.clone(),
                purchase_line: None,
                account: cmd.account.clone(),
                taxes: cmd.taxes.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_merge(&self, cmd: &MergePurchaseMatches) -> DomainResult<Vec<VendorBillEvent>> {
        self.ensure_draft(cmd.tenant_id, cmd.bill_id)?;

        let target = self.line(cmd.target_line_no).ok_or_else(|| {
            DomainError::validation(format!("bill line {} does not exist", cmd.target_line_no))
        })?;
        let Some((first, rest)) = cmd.matches.split_first() else {
            return Err(DomainError::validation("no purchase lines selected"));
        };
        if rest.iter().any(|m| m.product_id != first.product_id) {
            return Err(DomainError::validation(
                "selected purchase lines must have the same product",
            ));
        }
        if rest.iter().any(|m| m.uom != first.uom) {
            return Err(DomainError::validation(
                "selected purchase lines must have the same unit of measure",
            ));
        }

        let updated = BillLine {
            quantity: first.quantity,
            unit_price: first.unit_price,
            uom: first.uom.clone(),
            purchase_line: first.purchase_line,
            ..target.clone()
        };
        let appended = rest
            .iter()
            .zip(self.next_line_no()..)
            .map(|(m, line_no)| BillLine {
                line_no,
                product_id: m.product_id,
                description: m.description.clone(),
                quantity: m.quantity,
                unit_price: m.unit_price,
                uom: m.uom.clone(),
                purchase_line: m.purchase_line,
                account: target.account.clone(),
                taxes: target.taxes.clone(),
            })
            .collect();

        Ok(vec![VendorBillEvent::PurchaseMatchesMerged(
            PurchaseMatchesMerged {
                tenant_id: cmd.tenant_id,
                bill_id: cmd.bill_id,
                updated,
                appended,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_post(&self, cmd: &PostBill) -> DomainResult<Vec<VendorBillEvent>> {
        self.ensure_draft(cmd.tenant_id, cmd.bill_id)?;
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot post a bill without lines"));
        }

        Ok(vec![VendorBillEvent::BillPosted(BillPosted {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
