//! Internal transfers and their movements, as requested from and reported by
//! the host stock ledger.

use serde::{Deserialize, Serialize};

use batchline_core::{Entity, ValueObject, uuid_newtype};
use batchline_products::ProductId;

use crate::location::LocationId;
use crate::lot::LotRef;

uuid_newtype! {
    /// Transfer (picking) grouping one or more movements.
    pub struct TransferId;
}

uuid_newtype! {
    /// Single product movement inside a transfer.
    pub struct MovementId;
}

uuid_newtype! {
    /// Configured transfer operation type.
    pub struct OperationTypeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Incoming,
    Outgoing,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationType {
    pub id: OperationTypeId,
    pub name: String,
    pub kind: OperationKind,
}

/// Transfer lifecycle on the ledger side: created → confirmed → reserved → done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Draft,
    Confirmed,
    Reserved,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub operation_type: OperationTypeId,
    pub source: LocationId,
    pub destination: LocationId,
    /// Business document the transfer originates from (report reference).
    pub origin: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub source: LocationId,
    pub destination: LocationId,
    pub lot: Option<LotRef>,
    pub description: String,
    pub origin: String,
}

impl ValueObject for MovementRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub operation_type: OperationTypeId,
    pub source: LocationId,
    pub destination: LocationId,
    pub origin: String,
    pub note: Option<String>,
    pub status: TransferStatus,
    pub movements: Vec<MovementId>,
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub transfer_id: TransferId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub source: LocationId,
    pub destination: LocationId,
    pub lot: Option<LotRef>,
    pub description: String,
    pub origin: String,
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
