//! Snapshot-able stock ledger state backing the in-memory host.

use std::collections::HashMap;

use batchline_inventory::{
    InspectionReportId, Location, LocationId, LotRef, Movement, MovementId, MovementRequest,
    NewLocation, OperationKind, OperationType, OperationTypeId, Receipt, ReceiptId, Transfer,
    TransferId, TransferRequest, TransferStatus,
};
use batchline_products::ProductId;

use crate::inspection::{LedgerError, LedgerResult};

/// Stock bucket: product at a location, per lot name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct QuantKey {
    location: LocationId,
    product: ProductId,
    lot: Option<String>,
}

impl QuantKey {
    pub(crate) fn new(location: LocationId, product: ProductId, lot: Option<&LotRef>) -> Self {
        Self {
            location,
            product,
            lot: lot.map(|l| l.name().to_string()),
        }
    }

    fn of_source(m: &Movement) -> Self {
        Self::new(m.source, m.product_id, m.lot.as_ref())
    }

    fn of_destination(m: &Movement) -> Self {
        Self::new(m.destination, m.product_id, m.lot.as_ref())
    }
}

/// One tenant's ledger. Cloned wholesale when a session begins.
#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerState {
    pub(crate) receipts: HashMap<ReceiptId, Receipt>,
    pub(crate) locations: HashMap<LocationId, Location>,
    pub(crate) operation_types: Vec<OperationType>,
    pub(crate) transfers: HashMap<TransferId, Transfer>,
    pub(crate) movements: HashMap<MovementId, Movement>,
    on_hand: HashMap<QuantKey, i64>,
    reserved: HashMap<QuantKey, i64>,
    sequences: HashMap<String, u64>,
    pub(crate) reports_by_receipt: HashMap<ReceiptId, InspectionReportId>,
}

impl LedgerState {
    pub(crate) fn on_hand(&self, key: &QuantKey) -> i64 {
        self.on_hand.get(key).copied().unwrap_or(0)
    }

    fn available(&self, key: &QuantKey) -> i64 {
        self.on_hand(key) - self.reserved.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn set_on_hand(&mut self, key: QuantKey, quantity: i64) {
        self.on_hand.insert(key, quantity);
    }

    pub(crate) fn internal_transfer_type(&self) -> Option<&OperationType> {
        self.operation_types
            .iter()
            .find(|t| t.kind == OperationKind::Internal)
    }

    pub(crate) fn add_operation_type(&mut self, name: &str, kind: OperationKind) -> OperationType {
        let operation_type = OperationType {
            id: OperationTypeId::new(),
            name: name.to_string(),
            kind,
        };
        self.operation_types.push(operation_type.clone());
        operation_type
    }

    pub(crate) fn find_child(&self, parent: LocationId, name: &str) -> Option<&Location> {
        self.locations
            .values()
            .find(|l| l.parent == Some(parent) && l.name == name)
    }

    pub(crate) fn create_location(&mut self, new: NewLocation) -> LedgerResult<Location> {
        if let Some(parent) = new.parent {
            if !self.locations.contains_key(&parent) {
                return Err(LedgerError::NotFound(format!("parent location {parent}")));
            }
        }
        let location = Location {
            id: LocationId::new(),
            name: new.name,
            parent: new.parent,
            usage: new.usage,
        };
        self.locations.insert(location.id, location.clone());
        Ok(location)
    }

    pub(crate) fn next_reference(&mut self, code: &str) -> String {
        let counter = self.sequences.entry(code.to_string()).or_insert(0);
        *counter += 1;
        format!("{}/{:05}", code.to_uppercase(), counter)
    }

    pub(crate) fn create_transfer(&mut self, request: TransferRequest) -> LedgerResult<Transfer> {
        if !self
            .operation_types
            .iter()
            .any(|t| t.id == request.operation_type)
        {
            return Err(LedgerError::NotFound(format!(
                "operation type {}",
                request.operation_type
            )));
        }
        for location in [request.source, request.destination] {
            if !self.locations.contains_key(&location) {
                return Err(LedgerError::NotFound(format!("location {location}")));
            }
        }

        let transfer = Transfer {
            id: TransferId::new(),
            operation_type: request.operation_type,
            source: request.source,
            destination: request.destination,
            origin: request.origin,
            note: request.note,
            status: TransferStatus::Draft,
            movements: Vec::new(),
        };
        self.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    pub(crate) fn add_movement(
        &mut self,
        transfer_id: TransferId,
        request: MovementRequest,
    ) -> LedgerResult<Movement> {
        if request.quantity <= 0 {
            return Err(LedgerError::PostingRejected(format!(
                "movement quantity must be positive, got {}",
                request.quantity
            )));
        }
        let transfer = self.transfer_in(transfer_id, TransferStatus::Draft)?;

        let movement = Movement {
            id: MovementId::new(),
            transfer_id,
            product_id: request.product_id,
            quantity: request.quantity,
            source: request.source,
            destination: request.destination,
            lot: request.lot,
            description: request.description,
            origin: request.origin,
        };
        transfer.movements.push(movement.id);
        self.movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    pub(crate) fn confirm(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        self.transfer_in(transfer_id, TransferStatus::Draft)?.status = TransferStatus::Confirmed;
        Ok(())
    }

    pub(crate) fn reserve(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        let transfer = self.transfers.get(&transfer_id).ok_or_else(|| {
            LedgerError::NotFound(format!("transfer {transfer_id}"))
        })?;
        if transfer.status != TransferStatus::Confirmed {
            return Err(LedgerError::ReservationFailed(format!(
                "transfer {transfer_id} is {:?}, expected Confirmed",
                transfer.status
            )));
        }

        let mut needed: Vec<(QuantKey, i64)> = Vec::new();
        for movement in self.movements_of(transfer) {
            let key = QuantKey::of_source(movement);
            match needed.iter_mut().find(|(k, _)| *k == key) {
                Some((_, qty)) => *qty += movement.quantity,
                None => needed.push((key, movement.quantity)),
            }
        }
        for (key, requested) in &needed {
            let available = self.available(key);
            if *requested > available {
                return Err(LedgerError::InsufficientStock {
                    product: key.product,
                    location: key.location,
                    requested: *requested,
                    available,
                });
            }
        }

        for (key, qty) in needed {
            *self.reserved.entry(key).or_insert(0) += qty;
        }
        if let Some(t) = self.transfers.get_mut(&transfer_id) {
            t.status = TransferStatus::Reserved;
        }
        Ok(())
    }

    pub(crate) fn finalize(&mut self, transfer_id: TransferId) -> LedgerResult<()> {
        let transfer = self.transfers.get(&transfer_id).ok_or_else(|| {
            LedgerError::NotFound(format!("transfer {transfer_id}"))
        })?;
        if transfer.status != TransferStatus::Reserved {
            return Err(LedgerError::PostingRejected(format!(
                "transfer {transfer_id} is {:?}, expected Reserved",
                transfer.status
            )));
        }

        let moves: Vec<(QuantKey, QuantKey, i64)> = self
            .movements_of(transfer)
            .map(|m| (QuantKey::of_source(m), QuantKey::of_destination(m), m.quantity))
            .collect();
        for (source, destination, qty) in moves {
            *self.reserved.entry(source.clone()).or_insert(0) -= qty;
            *self.on_hand.entry(source).or_insert(0) -= qty;
            *self.on_hand.entry(destination).or_insert(0) += qty;
        }
        if let Some(t) = self.transfers.get_mut(&transfer_id) {
            t.status = TransferStatus::Done;
        }
        Ok(())
    }

    fn movements_of<'a>(&'a self, transfer: &'a Transfer) -> impl Iterator<Item = &'a Movement> {
        transfer
            .movements
            .iter()
            .filter_map(|id| self.movements.get(id))
    }

    fn transfer_in(
        &mut self,
        transfer_id: TransferId,
        status: TransferStatus,
    ) -> LedgerResult<&mut Transfer> {
        let transfer = self
            .transfers
            .get_mut(&transfer_id)
            .ok_or_else(|| LedgerError::NotFound(format!("transfer {transfer_id}")))?;
        if transfer.status != status {
            return Err(LedgerError::PostingRejected(format!(
                "transfer {transfer_id} is {:?}, expected {status:?}",
                transfer.status
            )));
        }
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::AggregateId;
    use batchline_inventory::LocationUsage;

    struct Fixture {
        ledger: LedgerState,
        stock: LocationId,
        qc: LocationId,
        op: OperationType,
        product: ProductId,
    }

    fn fixture(on_hand: i64) -> Fixture {
        let mut ledger = LedgerState::default();
        let stock = ledger
            .create_location(NewLocation {
                name: "Stock".to_string(),
                parent: None,
                usage: LocationUsage::Internal,
            })
            .unwrap()
            .id;
        let qc = ledger
            .create_location(NewLocation::internal_under("Quality Check", stock))
            .unwrap()
            .id;
        let op = ledger.add_operation_type("Internal Transfers", OperationKind::Internal);
        let product = ProductId::new(AggregateId::new());
        ledger.set_on_hand(
            QuantKey::new(stock, product, Some(&LotRef::unregistered("L1"))),
            on_hand,
        );
        Fixture {
            ledger,
            stock,
            qc,
            op,
            product,
        }
    }

    fn transfer_with_move(fx: &mut Fixture, qty: i64) -> TransferId {
        let transfer = fx
            .ledger
            .create_transfer(TransferRequest {
                operation_type: fx.op.id,
                source: fx.stock,
                destination: fx.qc,
                origin: "IR/00001".to_string(),
                note: None,
            })
            .unwrap();
        fx.ledger
            .add_movement(
                transfer.id,
                MovementRequest {
                    product_id: fx.product,
                    quantity: qty,
                    source: fx.stock,
                    destination: fx.qc,
                    lot: Some(LotRef::unregistered("L1")),
                    description: "Sample Move".to_string(),
                    origin: "IR/00001".to_string(),
                },
            )
            .unwrap();
        transfer.id
    }

    #[test]
    fn posting_moves_stock_between_locations() {
        let mut fx = fixture(100);
        let id = transfer_with_move(&mut fx, 10);
        fx.ledger.confirm(id).unwrap();
        fx.ledger.reserve(id).unwrap();
        fx.ledger.finalize(id).unwrap();

        let lot = LotRef::unregistered("L1");
        assert_eq!(fx.ledger.on_hand(&QuantKey::new(fx.stock, fx.product, Some(&lot))), 90);
        assert_eq!(fx.ledger.on_hand(&QuantKey::new(fx.qc, fx.product, Some(&lot))), 10);
        assert_eq!(fx.ledger.transfers[&id].status, TransferStatus::Done);
    }

    #[test]
    fn reserve_fails_on_insufficient_stock() {
        let mut fx = fixture(4);
        let id = transfer_with_move(&mut fx, 10);
        fx.ledger.confirm(id).unwrap();

        let err = fx.ledger.reserve(id).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                product: fx.product,
                location: fx.stock,
                requested: 10,
                available: 4,
            }
        );
    }

    #[test]
    fn lifecycle_order_is_enforced() {
        let mut fx = fixture(100);
        let id = transfer_with_move(&mut fx, 1);
        assert!(matches!(fx.ledger.reserve(id), Err(LedgerError::ReservationFailed(_))));
        assert!(matches!(fx.ledger.finalize(id), Err(LedgerError::PostingRejected(_))));
    }

    #[test]
    fn references_are_sequential_per_code() {
        let mut ledger = LedgerState::default();
        assert_eq!(ledger.next_reference("ir"), "IR/00001");
        assert_eq!(ledger.next_reference("ir"), "IR/00002");
        assert_eq!(ledger.next_reference("irl"), "IRL/00001");
    }
}
