use serde::{Deserialize, Serialize};

use batchline_core::{ValueObject, uuid_newtype};

uuid_newtype! {
    /// Entry in the host's lot/serial registry.
    pub struct LotId;
}

/// Lot identity carried on a stock movement.
///
/// Receipts may reference a registered lot or only a free-text lot name typed
/// in at receiving time; both forms must survive every hop a sample makes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LotRef {
    Registered { lot_id: LotId, name: String },
    Unregistered { name: String },
}

impl ValueObject for LotRef {}

impl LotRef {
    pub fn registered(lot_id: LotId, name: impl Into<String>) -> Self {
        Self::Registered {
            lot_id,
            name: name.into(),
        }
    }

    pub fn unregistered(name: impl Into<String>) -> Self {
        Self::Unregistered { name: name.into() }
    }

    /// Batch number as printed on the goods.
    pub fn name(&self) -> &str {
        match self {
            LotRef::Registered { name, .. } | LotRef::Unregistered { name } => name,
        }
    }

    pub fn lot_id(&self) -> Option<LotId> {
        match self {
            LotRef::Registered { lot_id, .. } => Some(*lot_id),
            LotRef::Unregistered { .. } => None,
        }
    }
}

impl core::fmt::Display for LotRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
