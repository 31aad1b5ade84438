use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, TenantId};
use batchline_events::Event;
use batchline_parties::PartyId;
use batchline_products::{PackInfo, ProductId};

/// Sales order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
}

/// Full discount, which marks a line as free goods.
pub const FREE_DISCOUNT_PERCENT: u8 = 100;

/// Gap left between consecutive line sequences.
const SEQUENCE_STEP: u32 = 10;

/// Order line: product, quantity, unit price, discount and pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    /// Display ordering.
    pub sequence: u32,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub discount_percent: u8,
    pub pack: PackInfo,
}

impl OrderLine {
    pub fn is_free(&self) -> bool {
        self.discount_percent == FREE_DISCOUNT_PERCENT
    }

    /// Net amount after discount, smallest currency unit.
    pub fn subtotal(&self) -> DomainResult<i64> {
        let overflow = || DomainError::validation(format!("line {} amount overflows", self.line_no));
        let unit_price = i64::try_from(self.unit_price).map_err(|_| overflow())?;
        let gross = self.quantity.checked_mul(unit_price).ok_or_else(overflow)?;
        let payable = i64::from(100u8.saturating_sub(self.discount_percent));
        Ok(gross.checked_mul(payable).ok_or_else(overflow)? / 100)
    }
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    tenant_id: Option<TenantId>,
    customer_id: Option<PartyId>,
    status: SalesOrderStatus,
    lines: Vec<OrderLine>,
    version: u64,
    created: bool,
}

impl SalesOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            customer_id: None,
            status: SalesOrderStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn customer_id(&self) -> Option<PartyId> {
        self.customer_id
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Draft)
    }

    pub fn amount_total(&self) -> DomainResult<i64> {
        self.lines.iter().try_fold(0i64, |total, line| {
            total.checked_add(line.subtotal()?).ok_or_else(|| {
                DomainError::validation("order total overflows")
            })
        })
    }

    fn next_sequence(&self) -> u32 {
        self.lines.iter().map(|l| l.sequence).max().unwrap_or(0) + SEQUENCE_STEP
    }

    fn next_line_no(&self) -> u32 {
        self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1
    }

    fn free_line_for(&self, product_id: ProductId) -> Option<&OrderLine> {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id && l.is_free())
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateSalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: PartyId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub discount_percent: u8,
    pub pack: PackInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddFreeUnits (free scheme).
///
/// Product name, list price and pack are read from the product master by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFreeUnits {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub list_price: u64,
    pub pack: PackInfo,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    CreateSalesOrder(CreateSalesOrder),
    AddLine(AddLine),
    AddFreeUnits(AddFreeUnits),
    ConfirmOrder(ConfirmOrder),
}

/// Event: SalesOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer_id: PartyId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line: OrderLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: FreeUnitsIncreased, more units on an existing free line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeUnitsIncreased {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub added: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    SalesOrderCreated(SalesOrderCreated),
    LineAdded(LineAdded),
    FreeUnitsIncreased(FreeUnitsIncreased),
    OrderConfirmed(OrderConfirmed),
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::SalesOrderCreated(_) => "sales.order.created",
            SalesOrderEvent::LineAdded(_) => "sales.order.line_added",
            SalesOrderEvent::FreeUnitsIncreased(_) => "sales.order.free_units_increased",
            SalesOrderEvent::OrderConfirmed(_) => "sales.order.confirmed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.occurred_at,
            SalesOrderEvent::LineAdded(e) => e.occurred_at,
            SalesOrderEvent::FreeUnitsIncreased(e) => e.occurred_at,
            SalesOrderEvent::OrderConfirmed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SalesOrderEvent::SalesOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.customer_id = Some(e.customer_id);
                self.status = SalesOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            SalesOrderEvent::LineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            SalesOrderEvent::FreeUnitsIncreased(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.quantity += e.added;
                }
            }
            SalesOrderEvent::OrderConfirmed(_) => {
                self.status = SalesOrderStatus::Confirmed;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SalesOrderCommand::CreateSalesOrder(cmd) => self.handle_create(cmd),
            SalesOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            SalesOrderCommand::AddFreeUnits(cmd) => self.handle_free_units(cmd),
            SalesOrderCommand::ConfirmOrder(cmd) => self.handle_confirm(cmd),
        }
    }
}

impl SalesOrder {
    fn ensure_modifiable(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify sales order once confirmed",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateSalesOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("sales order already exists"));
        }

        Ok(vec![SalesOrderEvent::SalesOrderCreated(SalesOrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_modifiable(cmd.tenant_id, cmd.order_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.discount_percent > FREE_DISCOUNT_PERCENT {
            return Err(DomainError::validation("discount cannot exceed 100%"));
        }

        Ok(vec![SalesOrderEvent::LineAdded(LineAdded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line: OrderLine {
                line_no: self.next_line_no(),
                sequence: self.next_sequence(),
                product_id: cmd.product_id,
                name: cmd.name.clone(),
                quantity: cmd.quantity,
                unit_price: cmd.unit_price,
                discount_percent: cmd.discount_percent,
                pack: cmd.pack.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_free_units(&self, cmd: &AddFreeUnits) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_modifiable(cmd.tenant_id, cmd.order_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation(
                "free product quantity must be greater than zero",
            ));
        }

        let event = match self.free_line_for(cmd.product_id) {
            Some(existing) => SalesOrderEvent::FreeUnitsIncreased(FreeUnitsIncreased {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                line_no: existing.line_no,
                added: cmd.quantity,
                occurred_at: cmd.occurred_at,
            }),
            None => SalesOrderEvent::LineAdded(LineAdded {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                line: OrderLine {
                    line_no: self.next_line_no(),
                    sequence: self.next_sequence(),
                    product_id: cmd.product_id,
                    name: format!("{} (Free)", cmd.product_name),
                    quantity: cmd.quantity,
                    unit_price: cmd.list_price,
                    discount_percent: FREE_DISCOUNT_PERCENT,
                    pack: cmd.pack.clone(),
                },
                occurred_at: cmd.occurred_at,
            }),
        };
        Ok(vec![event])
    }

    fn handle_confirm(&self, cmd: &ConfirmOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_modifiable(cmd.tenant_id, cmd.order_id)?;

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }

        Ok(vec![SalesOrderEvent::OrderConfirmed(OrderConfirmed {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_events::execute;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn tube_pack() -> PackInfo {
        PackInfo {
            pack: Some("6".to_string()),
            pack_uom: Some("Tubes".to_string()),
            ..PackInfo::default()
        }
    }

    fn draft_order() -> (SalesOrder, TenantId) {
        let tenant_id = TenantId::new();
        let order_id = SalesOrderId::new(AggregateId::new());
        let mut order = SalesOrder::empty(order_id);
        execute(
            &mut order,
            &SalesOrderCommand::CreateSalesOrder(CreateSalesOrder {
                tenant_id,
                order_id,
                customer_id: PartyId::new(AggregateId::new()),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        (order, tenant_id)
    }

    fn add_line(order: &mut SalesOrder, tenant_id: TenantId, product_id: ProductId, discount: u8) {
        let order_id = order.id_typed();
        execute(
            order,
            &SalesOrderCommand::AddLine(AddLine {
                tenant_id,
                order_id,
                product_id,
                name: "Rose Water 200ml".to_string(),
                quantity: 12,
                unit_price: 9_900,
                discount_percent: discount,
                pack: tube_pack(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
    }

    fn free_units(order: &mut SalesOrder, tenant_id: TenantId, product_id: ProductId, quantity: i64) -> Result<Vec<SalesOrderEvent>, DomainError> {
        let order_id = order.id_typed();
        execute(
            order,
            &SalesOrderCommand::AddFreeUnits(AddFreeUnits {
                tenant_id,
                order_id,
                product_id,
                product_name: "Rose Water 200ml".to_string(),
                list_price: 9_900,
                pack: tube_pack(),
                quantity,
                occurred_at: test_time(),
            }),
        )
    }

    #[test]
    fn free_units_create_a_discounted_line_after_the_last_sequence() {
        let (mut order, tenant_id) = draft_order();
        let product_id = ProductId::new(AggregateId::new());
        add_line(&mut order, tenant_id, product_id, 0);

        free_units(&mut order, tenant_id, product_id, 2).unwrap();

        assert_eq!(order.lines().len(), 2);
        let free = &order.lines()[1];
        assert_eq!(free.name, "Rose Water 200ml (Free)");
        assert_eq!(free.quantity, 2);
        assert_eq!(free.unit_price, 9_900);
        assert_eq!(free.sequence, order.lines()[0].sequence + 10);
        assert!(free.is_free());
        assert_eq!(free.subtotal(), Ok(0));
        assert_eq!(free.pack.display_pack(), "6 Tubes");
        assert_eq!(order.amount_total(), Ok(12 * 9_900));
    }

    #[test]
    fn subtotal_reports_overflow_instead_of_wrapping() {
        let line = OrderLine {
            line_no: 1,
            sequence: 10,
            product_id: ProductId::new(AggregateId::new()),
            name: "Bulk Glycerin".to_string(),
            quantity: 2,
            unit_price: u64::MAX,
            discount_percent: 0,
            pack: tube_pack(),
        };
        assert!(matches!(line.subtotal(), Err(DomainError::Validation(_))));

        let line = OrderLine {
            unit_price: i64::MAX as u64,
            ..line
        };
        assert!(matches!(line.subtotal(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn free_units_increment_existing_free_line() {
        let (mut order, tenant_id) = draft_order();
        let product_id = ProductId::new(AggregateId::new());

        free_units(&mut order, tenant_id, product_id, 2).unwrap();
        free_units(&mut order, tenant_id, product_id, 3).unwrap();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].quantity, 5);
        assert_eq!(order.lines()[0].sequence, 10);
    }

    #[test]
    fn partially_discounted_line_is_not_reused() {
        let (mut order, tenant_id) = draft_order();
        let product_id = ProductId::new(AggregateId::new());
        add_line(&mut order, tenant_id, product_id, 50);

        free_units(&mut order, tenant_id, product_id, 1).unwrap();
        assert_eq!(order.lines().len(), 2);
    }

    #[test]
    fn free_units_must_be_positive() {
        let (mut order, tenant_id) = draft_order();
        let err = free_units(&mut order, tenant_id, ProductId::new(AggregateId::new()), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(order.lines().is_empty());
    }

    #[test]
    fn confirmed_order_rejects_free_units() {
        let (mut order, tenant_id) = draft_order();
        let product_id = ProductId::new(AggregateId::new());
        add_line(&mut order, tenant_id, product_id, 0);
        let order_id = order.id_typed();
        execute(
            &mut order,
            &SalesOrderCommand::ConfirmOrder(ConfirmOrder {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        let err = free_units(&mut order, tenant_id, product_id, 1).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Repeated free-scheme applications accumulate on one line.
        #[test]
        fn free_quantities_accumulate(batches in proptest::collection::vec(1i64..50, 1..8)) {
            let (mut order, tenant_id) = draft_order();
            let product_id = ProductId::new(AggregateId::new());
            for n in &batches {
                free_units(&mut order, tenant_id, product_id, *n).unwrap();
            }
            prop_assert_eq!(order.lines().len(), 1);
            prop_assert_eq!(order.lines()[0].quantity, batches.iter().sum::<i64>());
            prop_assert_eq!(order.amount_total(), Ok(0));
        }
    }
}
