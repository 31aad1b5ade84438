use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use batchline_events::Event;
use batchline_parties::{AcceptanceCriterion, CriterionId, PartyId};

/// Product identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Packaging description shown on purchase and sales lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackInfo {
    /// Units per pack, free text ("10", "1x6").
    pub pack: Option<String>,
    pub pack_uom: Option<String>,
    pub pack_size: Option<String>,
    pub pack_size_uom: Option<String>,
}

impl PackInfo {
    /// `"<pack> <uom>"`, the bare pack when no unit is set, or empty.
    pub fn display_pack(&self) -> String {
        join_with_unit(self.pack.as_deref(), self.pack_uom.as_deref())
    }

    /// `"<size> <uom>"`, the bare size when no unit is set, or empty.
    pub fn display_pack_size(&self) -> String {
        join_with_unit(self.pack_size.as_deref(), self.pack_size_uom.as_deref())
    }

    pub fn has_pack(&self) -> bool {
        self.pack.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

fn join_with_unit(value: Option<&str>, unit: Option<&str>) -> String {
    match (value, unit) {
        (Some(v), Some(u)) if !v.is_empty() && !u.is_empty() => format!("{v} {u}"),
        (Some(v), _) => v.to_string(),
        (None, _) => String::new(),
    }
}

/// Master specification for incoming quality inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySpecification {
    pub color: Option<String>,
    pub spreadability: Option<String>,
    pub consistency: Option<String>,
    pub container_type: Option<String>,
    /// Approximate, in mm.
    pub container_size: Option<String>,
    pub cap_type: Option<String>,
    pub cap_size: Option<String>,
    pub label_type: Option<String>,
    pub label_size: Option<String>,
    pub monocarton_type: Option<String>,
    pub monocarton_size: Option<String>,
    pub master_pack_type: Option<String>,
    pub master_pack_size: Option<String>,
    pub pieces_per_box: Option<u32>,
}

/// A vendor acceptance criterion copied onto the product, with the value the
/// product must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCriterionLine {
    pub vendor_id: PartyId,
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub value: Option<String>,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    tenant_id: Option<TenantId>,
    sku: String,
    name: String,
    /// Maximum retail price, smallest currency unit.
    list_price: u64,
    hsn_code: Option<String>,
    group: Option<String>,
    shelf_life: Option<String>,
    packaging: PackInfo,
    specification: QualitySpecification,
    vendor_id: Option<PartyId>,
    vendor_criteria: Vec<VendorCriterionLine>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            tenant_id: None,
            sku: String::new(),
            name: String::new(),
            list_price: 0,
            hsn_code: None,
            group: None,
            shelf_life: None,
            packaging: PackInfo::default(),
            specification: QualitySpecification::default(),
            vendor_id: None,
            vendor_criteria: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn list_price(&self) -> u64 {
        self.list_price
    }

    pub fn hsn_code(&self) -> Option<&str> {
        self.hsn_code.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn shelf_life(&self) -> Option<&str> {
        self.shelf_life.as_deref()
    }

    pub fn packaging(&self) -> &PackInfo {
        &self.packaging
    }

    pub fn specification(&self) -> &QualitySpecification {
        &self.specification
    }

    pub fn vendor_id(&self) -> Option<PartyId> {
        self.vendor_id
    }

    pub fn vendor_criteria(&self) -> &[VendorCriterionLine] {
        &self.vendor_criteria
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub list_price: u64,
    pub hsn_code: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdatePackaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePackaging {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub packaging: PackInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateSpecification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpecification {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub group: Option<String>,
    pub shelf_life: Option<String>,
    pub specification: QualitySpecification,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignVendor.
///
/// `criteria` is the vendor's acceptance criteria at assignment time; they
/// replace whatever criterion lines the product had. `vendor_id: None` clears
/// the vendor and every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignVendor {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub vendor_id: Option<PartyId>,
    pub criteria: Vec<AcceptanceCriterion>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordCriterionValue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCriterionValue {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub criterion_id: CriterionId,
    pub value: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    UpdatePackaging(UpdatePackaging),
    UpdateSpecification(UpdateSpecification),
    AssignVendor(AssignVendor),
    RecordCriterionValue(RecordCriterionValue),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub list_price: u64,
    pub hsn_code: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PackagingUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingUpdated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub packaging: PackInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SpecificationUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationUpdated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub group: Option<String>,
    pub shelf_life: Option<String>,
    pub specification: QualitySpecification,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VendorAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorAssigned {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub vendor_id: Option<PartyId>,
    pub lines: Vec<VendorCriterionLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CriterionValueRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionValueRecorded {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub criterion_id: CriterionId,
    pub value: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    PackagingUpdated(PackagingUpdated),
    SpecificationUpdated(SpecificationUpdated),
    VendorAssigned(VendorAssigned),
    CriterionValueRecorded(CriterionValueRecorded),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::PackagingUpdated(_) => "products.product.packaging_updated",
            ProductEvent::SpecificationUpdated(_) => "products.product.specification_updated",
            ProductEvent::VendorAssigned(_) => "products.product.vendor_assigned",
            ProductEvent::CriterionValueRecorded(_) => "products.product.criterion_value_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::PackagingUpdated(e) => e.occurred_at,
            ProductEvent::SpecificationUpdated(e) => e.occurred_at,
            ProductEvent::VendorAssigned(e) => e.occurred_at,
            ProductEvent::CriterionValueRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.tenant_id = Some(e.tenant_id);
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.list_price = e.list_price;
                self.hsn_code = e.hsn_code.clone();
                self.created = true;
            }
            ProductEvent::PackagingUpdated(e) => {
                self.packaging = e.packaging.clone();
            }
            ProductEvent::SpecificationUpdated(e) => {
                self.group = e.group.clone();
                self.shelf_life = e.shelf_life.clone();
                self.specification = e.specification.clone();
            }
            ProductEvent::VendorAssigned(e) => {
                self.vendor_id = e.vendor_id;
                self.vendor_criteria = e.lines.clone();
            }
            ProductEvent::CriterionValueRecorded(e) => {
                if let Some(line) = self
                    .vendor_criteria
                    .iter_mut()
                    .find(|l| l.criterion_id == e.criterion_id)
                {
                    line.value = e.value.clone();
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::UpdatePackaging(cmd) => self.handle_packaging(cmd),
            ProductCommand::UpdateSpecification(cmd) => self.handle_specification(cmd),
            ProductCommand::AssignVendor(cmd) => self.handle_assign_vendor(cmd),
            ProductCommand::RecordCriterionValue(cmd) => self.handle_criterion_value(cmd),
        }
    }
}

impl Product {
    fn ensure_existing(&self, tenant_id: TenantId, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }
        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            sku: cmd.sku.trim().to_string(),
            name: cmd.name.trim().to_string(),
            list_price: cmd.list_price,
            hsn_code: cmd.hsn_code.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_packaging(&self, cmd: &UpdatePackaging) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.product_id)?;

        Ok(vec![ProductEvent::PackagingUpdated(PackagingUpdated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            packaging: cmd.packaging.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_specification(
        &self,
        cmd: &UpdateSpecification,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.product_id)?;

        Ok(vec![ProductEvent::SpecificationUpdated(SpecificationUpdated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            group: cmd.group.clone(),
            shelf_life: cmd.shelf_life.clone(),
            specification: cmd.specification.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_vendor(&self, cmd: &AssignVendor) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.product_id)?;

        let lines = match cmd.vendor_id {
            Some(vendor_id) => cmd
                .criteria
                .iter()
                .map(|c| VendorCriterionLine {
                    vendor_id,
                    criterion_id: c.criterion_id,
                    criterion_name: c.name.clone(),
                    value: None,
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(vec![ProductEvent::VendorAssigned(VendorAssigned {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            vendor_id: cmd.vendor_id,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_criterion_value(
        &self,
        cmd: &RecordCriterionValue,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.product_id)?;

        if !self
            .vendor_criteria
            .iter()
            .any(|l| l.criterion_id == cmd.criterion_id)
        {
            return Err(DomainError::validation(format!(
                "criterion {} is not assigned to this product",
                cmd.criterion_id
            )));
        }

        Ok(vec![ProductEvent::CriterionValueRecorded(CriterionValueRecorded {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            criterion_id: cmd.criterion_id,
            value: cmd.value.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
