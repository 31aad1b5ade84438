//! Lot-wise breakdown of received quantities, shown as note rows under each
//! purchase order line.

use serde::{Deserialize, Serialize};

use crate::order::LineItem;

/// Note row placed under `line_no`; `position` orders rows under the same line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotAnnotation {
    pub line_no: u32,
    pub position: u32,
    pub lot: String,
    pub quantity: i64,
    pub label: String,
}

impl LotAnnotation {
    fn new(line_no: u32, position: u32, lot: &str, quantity: i64) -> Self {
        Self {
            line_no,
            position,
            lot: lot.to_string(),
            quantity,
            label: format!("Lot {lot} → Qty Received: {quantity}"),
        }
    }
}

/// Group every line's received movements by lot, lots in first-seen order.
///
/// Movements without a lot are ignored, and lines with nothing lot-tracked get
/// no rows. The result is a complete replacement for previous annotations.
pub fn split_by_lot(lines: &[LineItem]) -> Vec<LotAnnotation> {
    let mut out = Vec::new();
    for line in lines {
        let mut per_lot: Vec<(&str, i64)> = Vec::new();
        for lot_move in &line.received {
            let Some(lot) = lot_move.lot.as_deref() else {
                continue;
            };
            match per_lot.iter_mut().find(|(name, _)| *name == lot) {
                Some((_, qty)) => *qty += lot_move.quantity,
                None => per_lot.push((lot, lot_move.quantity)),
            }
        }
        out.extend(
            per_lot
                .into_iter()
                .zip(1u32..)
                .map(|((lot, qty), position)| LotAnnotation::new(line.line_no, position, lot, qty)),
        );
    }
    out
}
