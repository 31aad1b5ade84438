//! Product master data.
//!
//! Besides identity and price, a product carries its packaging description,
//! the quality specification inspectors check received goods against, and the
//! acceptance criteria inherited from its preferred vendor.

pub mod product;

pub use product::{
    AssignVendor, CreateProduct, CriterionValueRecorded, PackInfo, PackagingUpdated, Product,
    ProductCommand, ProductCreated, ProductEvent, ProductId, QualitySpecification,
    RecordCriterionValue, SpecificationUpdated, UpdatePackaging, UpdateSpecification,
    VendorAssigned, VendorCriterionLine,
};
