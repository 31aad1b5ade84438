use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use batchline_core::{DomainError, DomainResult, Entity};
use batchline_products::ProductId;

use crate::lot::LotRef;
use crate::transfer::MovementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Accepted,
    Rejected,
}

/// Checklist items recorded per inspected product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckItem {
    /// Primary packing: tube, bottle, jar or pump.
    PrimaryPacking,
    /// Secondary packing: box or sticker.
    SecondaryPacking,
    Color,
    Consistency,
    Perfume,
    Spreadability,
}

/// Outcome of one checklist item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// `Some(false)` means the item deviates from the product specification.
    pub as_per_standard: Option<bool>,
    /// Why the item deviates; expected whenever `as_per_standard` is `Some(false)`.
    pub reason: Option<String>,
    /// Whether the supplier was informed and action taken.
    pub action_taken: Option<bool>,
}

impl CheckResult {
    pub fn validate(&self, item: CheckItem) -> DomainResult<()> {
        let reason_missing = self.reason.as_deref().is_none_or(|r| r.trim().is_empty());
        if self.as_per_standard == Some(false) && reason_missing {
            return Err(DomainError::validation(format!(
                "a reason is required when {item:?} is not as per standard"
            )));
        }
        Ok(())
    }
}

/// Descriptive data recorded on a line by the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDetails {
    pub release_number: Option<String>,
    pub standard_batch: Option<String>,
    pub manufactured_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    /// Printed MRP, smallest currency unit.
    pub mrp: Option<u64>,
    pub product_sent: Option<String>,
    pub observed_color: Option<String>,
}

impl LineDetails {
    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(mfg), Some(exp)) = (self.manufactured_on, self.expires_on) {
            if exp < mfg {
                return Err(DomainError::validation(
                    "expiry date cannot precede manufacture date",
                ));
            }
        }
        Ok(())
    }
}

/// One received product under inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionLine {
    pub line_no: u32,
    pub reference: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub received_quantity: i64,
    pub sample_quantity: Option<i64>,
    /// Lot assigned at receiving time, if any.
    pub lot: Option<LotRef>,
    pub details: LineDetails,
    pub checks: BTreeMap<CheckItem, CheckResult>,
    pub conclusion: Option<Conclusion>,
    pub remarks: Option<String>,
    /// Movement that carried this line's sample into quality check.
    pub qc_movement: Option<MovementId>,
}

impl InspectionLine {
    /// Units taken for inspection, zero when unset.
    pub fn sample(&self) -> i64 {
        self.sample_quantity.unwrap_or(0)
    }

    pub fn has_sample(&self) -> bool {
        self.sample() > 0
    }

    /// Received minus sampled, floored at zero.
    pub fn balance_quantity(&self) -> i64 {
        (self.received_quantity - self.sample()).max(0)
    }

    /// A recorded non-zero sample can no longer be changed.
    pub fn is_sample_locked(&self) -> bool {
        self.has_sample()
    }

    pub fn batch_number(&self) -> Option<&str> {
        self.lot.as_ref().map(LotRef::name)
    }
}

impl Entity for InspectionLine {
    type Id = u32;

    fn id(&self) -> &Self::Id {
        &self.line_no
    }
}
