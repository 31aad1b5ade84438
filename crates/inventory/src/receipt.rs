use serde::{Deserialize, Serialize};

use batchline_core::uuid_newtype;
use batchline_products::ProductId;

use crate::location::LocationId;
use crate::lot::LotRef;

uuid_newtype! {
    /// Incoming shipment (goods receipt).
    pub struct ReceiptId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Draft,
    Ready,
    Done,
    Cancelled,
}

/// One received (product, quantity, lot) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub lot: Option<LotRef>,
}

/// Receipt as exposed by the host ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub reference: String,
    /// Where the received goods were put away.
    pub destination: LocationId,
    pub status: ReceiptStatus,
    pub lines: Vec<ReceiptLine>,
}

/// A receipt's content folded per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub lot: Option<LotRef>,
}

impl Receipt {
    pub fn is_finalized(&self) -> bool {
        self.status == ReceiptStatus::Done
    }

    /// Lot of the first line for `product_id` that carries one.
    pub fn lot_for(&self, product_id: ProductId) -> Option<&LotRef> {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .find_map(|l| l.lot.as_ref())
    }

    /// Distinct products in first-seen order, quantities summed across lines.
    pub fn received_products(&self) -> Vec<ReceivedProduct> {
        let mut out: Vec<ReceivedProduct> = Vec::new();
        for line in &self.lines {
            match out.iter_mut().find(|p| p.product_id == line.product_id) {
                Some(existing) => existing.quantity += line.quantity,
                None => out.push(ReceivedProduct {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    lot: self.lot_for(line.product_id).cloned(),
                }),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::AggregateId;

    fn line(product_id: ProductId, quantity: i64, lot: Option<&str>) -> ReceiptLine {
        ReceiptLine {
            product_id,
            product_name: "Rose Water".to_string(),
            quantity,
            lot: lot.map(LotRef::unregistered),
        }
    }

    #[test]
    fn received_products_fold_duplicate_lines() {
        let a = ProductId::new(AggregateId::new());
        let b = ProductId::new(AggregateId::new());
        let receipt = Receipt {
            id: ReceiptId::new(),
            reference: "WH/IN/00012".to_string(),
            destination: LocationId::new(),
            status: ReceiptStatus::Done,
            lines: vec![line(a, 60, None), line(b, 5, None), line(a, 40, Some("L7"))],
        };

        let products = receipt.received_products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_id, a);
        assert_eq!(products[0].quantity, 100);
        assert_eq!(products[0].lot, Some(LotRef::unregistered("L7")));
        assert_eq!(products[1].lot, None);
    }
}
