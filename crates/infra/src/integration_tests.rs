//! End-to-end inspection workflow against the in-memory host.
//!
//! Engine → session → commit → report stream → bus → inspection history.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use batchline_core::{AggregateId, DomainError, TenantId};
    use batchline_inventory::inspection::{RemoveLine, StartInspection};
    use batchline_inventory::{
        InspectionCommand, InspectionEvent, InspectionReport, InspectionReportId,
        InspectionSettings, InspectionStatus, Location, LocationId, LocationUsage, LotId, LotRef,
        NewLocation, OperationKind, Receipt, ReceiptId, ReceiptLine, ReceiptStatus, TransferId,
        TransferStatus,
    };
    use batchline_products::ProductId;

    use crate::host::{InMemoryHost, InMemorySession, REPORT_AGGREGATE_TYPE};
    use crate::inspection::{
        HostSession, InspectionEngine, InspectionError, InspectionResult, LedgerError,
    };
    use crate::projections::InspectionHistoryProjection;
    use crate::read_model::InMemoryTenantStore;

    struct World {
        host: InMemoryHost,
        engine: InspectionEngine,
        tenant: TenantId,
        stock: LocationId,
        receipt_id: ReceiptId,
        cream: ProductId,
        cream_lot: LotRef,
        soap: ProductId,
    }

    impl World {
        /// Receipt of Cream 100 (lot L1) and Soap 50 (no lot) into WH/Stock.
        fn new() -> Self {
            Self::build(true, ReceiptStatus::Done)
        }

        fn build(with_internal_type: bool, receipt_status: ReceiptStatus) -> Self {
            Self::build_with(with_internal_type, receipt_status, LotRef::unregistered("L1"))
        }

        fn build_with(
            with_internal_type: bool,
            receipt_status: ReceiptStatus,
            cream_lot: LotRef,
        ) -> Self {
            batchline_observability::init();

            let host = InMemoryHost::new();
            let tenant = TenantId::new();
            let stock = host
                .add_location(
                    tenant,
                    NewLocation {
                        name: "WH/Stock".to_string(),
                        parent: None,
                        usage: LocationUsage::Internal,
                    },
                )
                .unwrap()
                .id;
            if with_internal_type {
                host.add_operation_type(tenant, "Internal Transfers", OperationKind::Internal)
                    .unwrap();
            }

            let cream = ProductId::new(AggregateId::new());
            let soap = ProductId::new(AggregateId::new());
            let receipt_id = ReceiptId::new();
            host.add_receipt(
                tenant,
                Receipt {
                    id: receipt_id,
                    reference: "WH/IN/00007".to_string(),
                    destination: stock,
                    status: receipt_status,
                    lines: vec![
                        ReceiptLine {
                            product_id: cream,
                            product_name: "Cream".to_string(),
                            quantity: 100,
                            lot: Some(cream_lot.clone()),
                        },
                        ReceiptLine {
                            product_id: soap,
                            product_name: "Soap".to_string(),
                            quantity: 50,
                            lot: None,
                        },
                    ],
                },
            )
            .unwrap();
            host.set_stock(tenant, stock, cream, Some(&cream_lot), 100)
                .unwrap();
            host.set_stock(tenant, stock, soap, None, 50).unwrap();

            Self {
                host,
                engine: InspectionEngine::new(InspectionSettings::default()),
                tenant,
                stock,
                receipt_id,
                cream,
                cream_lot,
                soap,
            }
        }

        /// Run `f` in a fresh session and commit it if `f` succeeds.
        fn run<T>(
            &self,
            f: impl FnOnce(&InspectionEngine, &mut InMemorySession<'_>) -> InspectionResult<T>,
        ) -> InspectionResult<T> {
            self.run_with(&self.engine, f)
        }

        fn run_with<T>(
            &self,
            engine: &InspectionEngine,
            f: impl FnOnce(&InspectionEngine, &mut InMemorySession<'_>) -> InspectionResult<T>,
        ) -> InspectionResult<T> {
            let mut session = self.host.begin(self.tenant)?;
            let out = f(engine, &mut session)?;
            session.commit()?;
            Ok(out)
        }

        fn create_report(&self) -> InspectionReport {
            let receipt_id = self.receipt_id;
            self.run(|engine, s| engine.create_report(s, receipt_id, None))
                .unwrap()
        }

        fn report(&self, id: InspectionReportId) -> InspectionReport {
            self.run(|engine, s| engine.report(s, id)).unwrap()
        }

        fn set_sample(&self, id: InspectionReportId, line_no: u32, qty: i64) -> InspectionResult<InspectionReport> {
            self.run(|engine, s| engine.set_sample_quantity(s, id, line_no, qty))
        }

        fn location(&self, name: &str) -> Location {
            self.host
                .locations(self.tenant)
                .unwrap()
                .into_iter()
                .find(|l| l.name == name)
                .unwrap()
        }

        fn on_hand(&self, location: LocationId, product: ProductId, lot: Option<&str>) -> i64 {
            let lot = lot.map(LotRef::unregistered);
            self.host
                .on_hand(self.tenant, location, product, lot.as_ref())
                .unwrap()
        }

        fn lot_on_hand(&self, location: LocationId) -> i64 {
            self.host
                .on_hand(self.tenant, location, self.cream, Some(&self.cream_lot))
                .unwrap()
        }

        fn transfer_status(&self, id: TransferId) -> TransferStatus {
            self.host
                .transfers(self.tenant)
                .unwrap()
                .into_iter()
                .find(|t| t.id == id)
                .unwrap()
                .status
        }
    }

    #[test]
    fn two_product_inspection_moves_samples_through_qc_to_retention() {
        let w = World::new();
        let report = w.create_report();
        let id = report.id_typed();

        assert_eq!(report.status(), InspectionStatus::Pending);
        assert_eq!(report.lines().len(), 2);
        let cream_line = report.line(1).unwrap();
        assert_eq!(cream_line.product_id, w.cream);
        assert_eq!(cream_line.received_quantity, 100);
        assert_eq!(cream_line.batch_number(), Some("L1"));
        let soap_line = report.line(2).unwrap();
        assert_eq!(soap_line.product_id, w.soap);
        assert_eq!(soap_line.batch_number(), None);

        w.set_sample(id, 1, 10).unwrap();
        let report = w.set_sample(id, 2, 5).unwrap();
        assert_eq!(report.line(1).unwrap().balance_quantity(), 90);
        assert_eq!(report.line(2).unwrap().balance_quantity(), 45);

        let started = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        assert_eq!(started.status(), InspectionStatus::InProgress);

        let qc = w.location("Quality Check");
        assert_eq!(qc.parent, Some(w.stock));
        let qc_transfer = started.qc_transfer().unwrap();
        assert_eq!(w.transfer_status(qc_transfer), TransferStatus::Done);

        let qc_moves = w.host.movements_of(w.tenant, qc_transfer).unwrap();
        assert_eq!(qc_moves.len(), 2);
        let cream_move = qc_moves.iter().find(|m| m.product_id == w.cream).unwrap();
        assert_eq!(cream_move.quantity, 10);
        assert_eq!(cream_move.lot, Some(LotRef::unregistered("L1")));
        assert_eq!(cream_move.description, "Sample Move for Cream");
        assert_eq!(cream_move.origin, started.reference());
        let soap_move = qc_moves.iter().find(|m| m.product_id == w.soap).unwrap();
        assert_eq!(soap_move.quantity, 5);
        assert_eq!(soap_move.lot, None);

        assert_eq!(w.on_hand(w.stock, w.cream, Some("L1")), 90);
        assert_eq!(w.on_hand(qc.id, w.cream, Some("L1")), 10);
        assert_eq!(w.on_hand(qc.id, w.soap, None), 5);

        let completed = w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();
        assert_eq!(completed.status(), InspectionStatus::Completed);

        let retention = w.location("Retain Sample");
        assert_eq!(retention.parent, Some(w.stock));
        let retention_transfer = completed.retention_transfer().unwrap();
        let retained = w.host.movements_of(w.tenant, retention_transfer).unwrap();
        assert_eq!(retained.len(), 2);
        let cream_retained = retained.iter().find(|m| m.product_id == w.cream).unwrap();
        assert_eq!(cream_retained.source, qc.id);
        assert_eq!(cream_retained.lot, Some(LotRef::unregistered("L1")));
        assert_eq!(cream_retained.description, "Retain Sample Move for Cream");

        assert_eq!(w.on_hand(qc.id, w.cream, Some("L1")), 0);
        assert_eq!(w.on_hand(retention.id, w.cream, Some("L1")), 10);
        assert_eq!(w.on_hand(retention.id, w.soap, None), 5);
        assert_eq!(w.on_hand(w.stock, w.soap, None), 45);
    }

    #[test]
    fn registered_lot_survives_both_sample_hops() {
        let lot = LotRef::registered(LotId::new(), "R1");
        let w = World::build_with(true, ReceiptStatus::Done, lot.clone());
        let report = w.create_report();
        let id = report.id_typed();
        assert_eq!(report.line(1).unwrap().lot, Some(lot.clone()));

        w.set_sample(id, 1, 7).unwrap();
        let started = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        let completed = w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();

        let qc_moves = w.host.movements_of(w.tenant, started.qc_transfer().unwrap()).unwrap();
        let retained = w
            .host
            .movements_of(w.tenant, completed.retention_transfer().unwrap())
            .unwrap();
        let to_qc = qc_moves.iter().find(|m| m.product_id == w.cream).unwrap();
        let to_retention = retained.iter().find(|m| m.product_id == w.cream).unwrap();
        assert_eq!(to_qc.lot, Some(lot.clone()));
        assert_eq!(to_retention.lot, Some(lot.clone()));
        assert_eq!(to_qc.lot.as_ref().and_then(LotRef::lot_id), lot.lot_id());

        let qc = w.location("Quality Check");
        let retention = w.location("Retain Sample");
        assert_eq!(w.lot_on_hand(w.stock), 93);
        assert_eq!(w.lot_on_hand(qc.id), 0);
        assert_eq!(w.lot_on_hand(retention.id), 7);
    }

    #[test]
    fn begin_without_samples_posts_an_empty_transfer() {
        let w = World::new();
        let id = w.create_report().id_typed();

        let started = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        assert_eq!(started.status(), InspectionStatus::InProgress);

        let transfer = started.qc_transfer().unwrap();
        assert!(w.host.movements_of(w.tenant, transfer).unwrap().is_empty());
        assert_eq!(w.transfer_status(transfer), TransferStatus::Done);
        assert_eq!(w.on_hand(w.stock, w.cream, Some("L1")), 100);
    }

    #[test]
    fn completing_a_report_without_lines_posts_nothing() {
        let w = World::new();
        let id = w.create_report().id_typed();
        for line_no in [1, 2] {
            w.run(|engine, s| {
                let tenant_id = s.tenant_id();
                engine.amend_report(
                    s,
                    InspectionCommand::RemoveLine(RemoveLine {
                        tenant_id,
                        report_id: id,
                        line_no,
                        occurred_at: Utc::now(),
                    }),
                )
            })
            .unwrap();
        }

        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        let completed = w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();

        assert_eq!(completed.status(), InspectionStatus::Completed);
        assert_eq!(completed.retention_transfer(), None);
        assert_eq!(w.host.transfers(w.tenant).unwrap().len(), 1);
        assert!(w.host.locations(w.tenant).unwrap().iter().all(|l| l.name != "Retain Sample"));
    }

    #[test]
    fn sample_quantity_cannot_be_changed_once_set() {
        let w = World::new();
        let id = w.create_report().id_typed();
        w.set_sample(id, 1, 10).unwrap();

        let err = w.set_sample(id, 1, 12).unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::Locked(_))));
        assert_eq!(w.report(id).line(1).unwrap().sample_quantity, Some(10));
    }

    #[test]
    fn sample_above_received_quantity_is_rejected() {
        let w = World::new();
        let id = w.create_report().id_typed();

        let err = w.set_sample(id, 2, 51).unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn status_only_moves_forward() {
        let w = World::new();
        let id = w.create_report().id_typed();

        let err = w.run(|engine, s| engine.complete_inspection(s, id)).unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::InvalidTransition(_))));

        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        let err = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::InvalidTransition(_))));
    }

    #[test]
    fn completing_without_a_qc_location_fails() {
        let w = World::new();
        let id = w.create_report().id_typed();
        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();

        let relocated = InspectionEngine::new(InspectionSettings {
            quality_check_location: "QC Bay".to_string(),
            ..InspectionSettings::default()
        });
        let err = w
            .run_with(&relocated, |engine, s| engine.complete_inspection(s, id))
            .unwrap_err();
        assert_eq!(err, InspectionError::MissingQcLocation("QC Bay".to_string()));
        assert_eq!(w.report(id).status(), InspectionStatus::InProgress);
    }

    #[test]
    fn begin_requires_an_internal_transfer_type() {
        let w = World::build(false, ReceiptStatus::Done);
        let id = w.create_report().id_typed();

        let err = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap_err();
        assert!(matches!(err, InspectionError::MissingConfiguration(_)));
        assert_eq!(w.report(id).status(), InspectionStatus::Pending);
        assert!(w.host.transfers(w.tenant).unwrap().is_empty());
    }

    #[test]
    fn reports_are_only_created_from_done_receipts() {
        let w = World::build(true, ReceiptStatus::Ready);
        let receipt_id = w.receipt_id;
        let err = w
            .run(|engine, s| engine.create_report(s, receipt_id, None))
            .unwrap_err();
        assert!(matches!(err, InspectionError::InvalidReceipt { .. }));

        let unknown = ReceiptId::new();
        let err = w
            .run(|engine, s| engine.create_report(s, unknown, None))
            .unwrap_err();
        assert!(matches!(err, InspectionError::InvalidReceipt { receipt_id, .. } if receipt_id == unknown));
    }

    #[test]
    fn receipts_without_lines_are_rejected() {
        let w = World::new();
        let empty = ReceiptId::new();
        w.host
            .add_receipt(
                w.tenant,
                Receipt {
                    id: empty,
                    reference: "WH/IN/00008".to_string(),
                    destination: w.stock,
                    status: ReceiptStatus::Done,
                    lines: vec![],
                },
            )
            .unwrap();

        let err = w.run(|engine, s| engine.create_report(s, empty, None)).unwrap_err();
        assert!(matches!(err, InspectionError::InvalidReceipt { .. }));
    }

    #[test]
    fn insufficient_stock_aborts_begin_without_side_effects() {
        let w = World::new();
        w.host
            .set_stock(w.tenant, w.stock, w.cream, Some(&LotRef::unregistered("L1")), 3)
            .unwrap();
        let id = w.create_report().id_typed();
        w.set_sample(id, 1, 10).unwrap();

        let err = w.run(|engine, s| engine.begin_inspection(s, id)).unwrap_err();
        assert_eq!(
            err,
            InspectionError::Ledger(LedgerError::InsufficientStock {
                product: w.cream,
                location: w.stock,
                requested: 10,
                available: 3,
            })
        );
        assert_eq!(w.report(id).status(), InspectionStatus::Pending);
        assert!(w.host.transfers(w.tenant).unwrap().is_empty());
        assert!(w.host.locations(w.tenant).unwrap().iter().all(|l| l.name != "Quality Check"));
        assert_eq!(w.on_hand(w.stock, w.cream, Some("L1")), 3);
    }

    #[test]
    fn late_sample_is_retained_from_the_receiving_location() {
        let w = World::new();
        let id = w.create_report().id_typed();
        w.set_sample(id, 1, 10).unwrap();
        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();

        w.set_sample(id, 2, 5).unwrap();
        let completed = w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();

        let retained = w
            .host
            .movements_of(w.tenant, completed.retention_transfer().unwrap())
            .unwrap();
        let soap = retained.iter().find(|m| m.product_id == w.soap).unwrap();
        assert_eq!(soap.source, w.stock);
        assert_eq!(soap.quantity, 5);

        let retention = w.location("Retain Sample");
        assert_eq!(w.on_hand(w.stock, w.soap, None), 45);
        assert_eq!(w.on_hand(retention.id, w.soap, None), 5);
        assert_eq!(w.on_hand(retention.id, w.cream, Some("L1")), 10);
    }

    #[test]
    fn completed_reports_are_read_only() {
        let w = World::new();
        let id = w.create_report().id_typed();
        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
        w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();

        let err = w.set_sample(id, 1, 1).unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::InvalidTransition(_))));
    }

    #[test]
    fn workflow_commands_cannot_be_amended_in() {
        let w = World::new();
        let id = w.create_report().id_typed();

        let err = w
            .run(|engine, s| {
                let tenant_id = s.tenant_id();
                engine.amend_report(
                    s,
                    InspectionCommand::StartInspection(StartInspection {
                        tenant_id,
                        report_id: id,
                        qc_transfer: TransferId::new(),
                        sample_movements: vec![],
                        occurred_at: Utc::now(),
                    }),
                )
            })
            .unwrap_err();
        assert!(matches!(err, InspectionError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn open_or_create_returns_the_existing_report() {
        let w = World::new();
        assert!(!w.run(|engine, s| engine.has_inspection(s, w.receipt_id)).unwrap());

        let ids: Vec<InspectionReportId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let w = &w;
                    scope.spawn(move || {
                        let guard = w.engine.lock_receipt(w.receipt_id);
                        let mut session = w.host.begin(w.tenant).unwrap();
                        let report = w
                            .engine
                            .open_or_create_report(&mut session, &guard, None)
                            .unwrap();
                        session.commit().unwrap();
                        report.id_typed()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert!(w.run(|engine, s| engine.has_inspection(s, w.receipt_id)).unwrap());
        assert_eq!(w.host.report_streams().stream_version(w.tenant, ids[0].0).unwrap(), 1);
    }

    #[test]
    fn committed_events_reach_the_history_projection() {
        let w = World::new();
        let subscription = w.host.subscribe();

        {
            let receipt_id = w.receipt_id;
            let mut session = w.host.begin(w.tenant).unwrap();
            w.engine.create_report(&mut session, receipt_id, None).unwrap();
        }
        assert!(subscription.drain().is_empty());

        let id = w.create_report().id_typed();
        w.set_sample(id, 1, 10).unwrap();
        w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();

        let envelopes = subscription.drain();
        assert_eq!(envelopes.len(), 3);
        assert!(envelopes.iter().all(|e| e.aggregate_type() == REPORT_AGGREGATE_TYPE));
        assert_eq!(
            envelopes.iter().map(|e| e.sequence_number()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(matches!(envelopes[0].payload(), InspectionEvent::ReportCreated(_)));
        assert!(matches!(envelopes[2].payload(), InspectionEvent::InspectionStarted(_)));

        let history = InspectionHistoryProjection::new(InMemoryTenantStore::new());
        for envelope in &envelopes {
            history.apply_envelope(envelope).unwrap();
        }
        let cream = history.history_for(w.tenant, w.cream);
        assert_eq!(cream.len(), 1);
        assert_eq!(cream[0].sample_quantity, Some(10));
        assert_eq!(cream[0].status, InspectionStatus::InProgress);
        assert!(history.history_for(TenantId::new(), w.cream).is_empty());
    }

    #[test]
    fn sessions_of_other_tenants_cannot_read_reports() {
        let w = World::new();
        let id = w.create_report().id_typed();

        let stranger = TenantId::new();
        let mut session = w.host.begin(stranger).unwrap();
        let err = w.engine.report(&mut session, id).unwrap_err();
        assert!(matches!(err, InspectionError::ReportNotFound(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 48,
            ..ProptestConfig::default()
        })]

        /// Sampling only relocates stock; per product the receiving, QC and
        /// retention locations always add up to what was received.
        #[test]
        fn inspection_conserves_received_stock(
            cream_sample in 0i64..=100,
            soap_sample in 0i64..=50,
            sample_late in any::<bool>(),
        ) {
            let w = World::new();
            let id = w.create_report().id_typed();
            w.set_sample(id, 1, cream_sample).unwrap();
            if !sample_late {
                w.set_sample(id, 2, soap_sample).unwrap();
            }
            w.run(|engine, s| engine.begin_inspection(s, id)).unwrap();
            if sample_late {
                w.set_sample(id, 2, soap_sample).unwrap();
            }
            w.run(|engine, s| engine.complete_inspection(s, id)).unwrap();

            let totals = |product: ProductId, lot: Option<&str>| {
                let qc = w.on_hand(w.location("Quality Check").id, product, lot);
                let retained = w
                    .host
                    .locations(w.tenant)
                    .unwrap()
                    .into_iter()
                    .find(|l| l.name == "Retain Sample")
                    .map_or(0, |l| w.on_hand(l.id, product, lot));
                (w.on_hand(w.stock, product, lot), qc, retained)
            };

            let (stock, qc, retained) = totals(w.cream, Some("L1"));
            prop_assert_eq!(stock + qc + retained, 100);
            prop_assert_eq!(qc, 0);
            prop_assert_eq!(retained, cream_sample);

            let (stock, qc, retained) = totals(w.soap, None);
            prop_assert_eq!(stock + qc + retained, 50);
            prop_assert_eq!(qc, 0);
            prop_assert_eq!(retained, soap_sample);
        }
    }
}
