use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;
use tracing::warn;

use batchline_core::{AggregateId, TenantId};
use batchline_events::{Delivery, EventEnvelope, Projection};
use batchline_inventory::{
    Conclusion, InspectionEvent, InspectionReportId, InspectionStatus, ReceiptId,
};
use batchline_products::ProductId;

use crate::read_model::TenantStore;

/// One inspected line, as listed in a product's inspection history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionHistoryEntry {
    pub report_id: InspectionReportId,
    pub report_reference: String,
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub line_reference: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub received_quantity: i64,
    pub sample_quantity: Option<i64>,
    pub batch_number: Option<String>,
    pub status: InspectionStatus,
    pub conclusion: Option<Conclusion>,
    pub remarks: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub report_id: InspectionReportId,
    pub line_no: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InspectionHistoryError {
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Product inspection history, fed by published inspection events.
///
/// Replays at or below the stream cursor are ignored, so at-least-once
/// delivery is safe.
#[derive(Debug)]
pub struct InspectionHistoryProjection<S>
where
    S: TenantStore<HistoryKey, InspectionHistoryEntry>,
{
    store: S,
    cursors: RwLock<HashMap<(TenantId, AggregateId), u64>>,
}

impl<S> InspectionHistoryProjection<S>
where
    S: TenantStore<HistoryKey, InspectionHistoryEntry>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    /// Every inspected line of `product_id`, oldest report first.
    pub fn history_for(&self, tenant_id: TenantId, product_id: ProductId) -> Vec<InspectionHistoryEntry> {
        let mut entries: Vec<_> = self
            .store
            .list(tenant_id)
            .into_iter()
            .filter(|e| e.product_id == product_id)
            .collect();
        entries.sort_by(|a, b| {
            (a.report_id.0.as_uuid(), a.line_no).cmp(&(b.report_id.0.as_uuid(), b.line_no))
        });
        entries
    }

    pub fn entry(&self, tenant_id: TenantId, key: &HistoryKey) -> Option<InspectionHistoryEntry> {
        self.store.get(tenant_id, key)
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<InspectionEvent>,
    ) -> Result<(), InspectionHistoryError> {
        let key = envelope.stream_key();
        let (tenant_id, aggregate_id) = key;
        let event = envelope.payload();

        if event.tenant_id() != tenant_id {
            return Err(InspectionHistoryError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if event.report_id().0 != aggregate_id {
            return Err(InspectionHistoryError::TenantIsolation(
                "event report_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let mut cursors = self
            .cursors
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let last = cursors.get(&key).copied().unwrap_or(0);
        match envelope.delivery_after(last) {
            Delivery::Duplicate => Ok(()),
            Delivery::Gap { .. } => Err(InspectionHistoryError::NonMonotonicSequence {
                last,
                found: envelope.sequence_number(),
            }),
            Delivery::Next => {
                self.fold(tenant_id, event);
                cursors.insert(key, envelope.sequence_number());
                Ok(())
            }
        }
    }

    /// Drop the tenants' rows and replay `envelopes` in stream order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<InspectionEvent>>,
    ) -> Result<(), InspectionHistoryError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        let mut tenants: Vec<_> = envs.iter().map(|e| e.tenant_id()).collect();
        tenants.sort();
        tenants.dedup();
        for tenant_id in &tenants {
            self.store.clear_tenant(*tenant_id);
        }
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|(tenant_id, _), _| !tenants.contains(tenant_id));
        }

        envs.sort_by_key(|e| (e.stream_key(), e.sequence_number()));
        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }

    fn fold(&self, tenant_id: TenantId, event: &InspectionEvent) {
        match event {
            InspectionEvent::ReportCreated(e) => {
                for (line, line_no) in e.lines.iter().zip(1u32..) {
                    self.store.upsert(
                        tenant_id,
                        HistoryKey {
                            report_id: e.report_id,
                            line_no,
                        },
                        InspectionHistoryEntry {
                            report_id: e.report_id,
                            report_reference: e.reference.clone(),
                            receipt_id: e.receipt_id,
                            line_no,
                            line_reference: line.reference.clone(),
                            product_id: line.product_id,
                            product_name: line.product_name.clone(),
                            received_quantity: line.received_quantity,
                            sample_quantity: None,
                            batch_number: line.lot.as_ref().map(|l| l.name().to_string()),
                            status: InspectionStatus::Pending,
                            conclusion: None,
                            remarks: None,
                        },
                    );
                }
            }
            InspectionEvent::SampleQuantitySet(e) => {
                self.update(tenant_id, e.report_id, e.line_no, |entry| {
                    entry.sample_quantity = Some(e.quantity);
                });
            }
            InspectionEvent::ConclusionRecorded(e) => {
                self.update(tenant_id, e.report_id, e.line_no, |entry| {
                    entry.conclusion = e.conclusion;
                    entry.remarks = e.remarks.clone();
                });
            }
            InspectionEvent::LineRemoved(e) => {
                self.store.remove(
                    tenant_id,
                    &HistoryKey {
                        report_id: e.report_id,
                        line_no: e.line_no,
                    },
                );
            }
            InspectionEvent::InspectionStarted(e) => {
                self.set_status(tenant_id, e.report_id, InspectionStatus::InProgress);
            }
            InspectionEvent::InspectionCompleted(e) => {
                self.set_status(tenant_id, e.report_id, InspectionStatus::Completed);
            }
            InspectionEvent::LineDetailsUpdated(_) | InspectionEvent::CheckRecorded(_) => {}
        }
    }

    fn update(
        &self,
        tenant_id: TenantId,
        report_id: InspectionReportId,
        line_no: u32,
        f: impl FnOnce(&mut InspectionHistoryEntry),
    ) {
        let key = HistoryKey { report_id, line_no };
        if let Some(mut entry) = self.store.get(tenant_id, &key) {
            f(&mut entry);
            self.store.upsert(tenant_id, key, entry);
        }
    }

    fn set_status(&self, tenant_id: TenantId, report_id: InspectionReportId, status: InspectionStatus) {
        for mut entry in self
            .store
            .list(tenant_id)
            .into_iter()
            .filter(|e| e.report_id == report_id)
        {
            entry.status = status;
            let key = HistoryKey {
                report_id,
                line_no: entry.line_no,
            };
            self.store.upsert(tenant_id, key, entry);
        }
    }
}

impl<S> Projection for InspectionHistoryProjection<S>
where
    S: TenantStore<HistoryKey, InspectionHistoryEntry>,
{
    type Ev = InspectionEvent;

    fn apply(&mut self, envelope: &EventEnvelope<InspectionEvent>) {
        if let Err(err) = self.apply_envelope(envelope) {
            warn!(
                event_id = %envelope.event_id(),
                sequence = envelope.sequence_number(),
                error = %err,
                "inspection history projection skipped event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use batchline_inventory::inspection::{
        ConclusionRecorded, InspectionCompleted, LineRemoved, ReportCreated, SampleQuantitySet,
    };
    use batchline_inventory::{LotRef, NewInspectionLine};

    use crate::read_model::InMemoryTenantStore;

    struct Stream {
        tenant_id: TenantId,
        report_id: InspectionReportId,
        seq: u64,
    }

    impl Stream {
        fn new() -> Self {
            Self {
                tenant_id: TenantId::new(),
                report_id: InspectionReportId::new(AggregateId::new()),
                seq: 0,
            }
        }

        fn envelope(&mut self, event: InspectionEvent) -> EventEnvelope<InspectionEvent> {
            self.seq += 1;
            EventEnvelope::new(
                Uuid::now_v7(),
                self.tenant_id,
                self.report_id.0,
                "inventory.inspection".to_string(),
                self.seq,
                event,
            )
        }

        fn created(&mut self, products: &[(ProductId, &str)]) -> EventEnvelope<InspectionEvent> {
            let lines = products
                .iter()
                .enumerate()
                .map(|(i, (product_id, name))| NewInspectionLine {
                    reference: format!("IRL/{:05}", i + 1),
                    product_id: *product_id,
                    product_name: name.to_string(),
                    received_quantity: 100,
                    lot: Some(LotRef::unregistered("L1")),
                })
                .collect();
            let event = InspectionEvent::ReportCreated(ReportCreated {
                tenant_id: self.tenant_id,
                report_id: self.report_id,
                reference: "IR/00001".to_string(),
                receipt_id: ReceiptId::new(),
                inspector: None,
                lines,
                occurred_at: Utc::now(),
            });
            self.envelope(event)
        }
    }

    fn projection() -> InspectionHistoryProjection<InMemoryTenantStore<HistoryKey, InspectionHistoryEntry>> {
        InspectionHistoryProjection::new(InMemoryTenantStore::new())
    }

    #[test]
    fn lines_are_listed_per_product() {
        let p = projection();
        let mut stream = Stream::new();
        let cream = ProductId::new(AggregateId::new());
        let soap = ProductId::new(AggregateId::new());

        p.apply_envelope(&stream.created(&[(cream, "Cream"), (soap, "Soap")])).unwrap();
        let sample = InspectionEvent::SampleQuantitySet(SampleQuantitySet {
            tenant_id: stream.tenant_id,
            report_id: stream.report_id,
            line_no: 2,
            quantity: 5,
            occurred_at: Utc::now(),
        });
        p.apply_envelope(&stream.envelope(sample)).unwrap();

        let history = p.history_for(stream.tenant_id, soap);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].product_name, "Soap");
        assert_eq!(history[0].sample_quantity, Some(5));
        assert_eq!(history[0].batch_number.as_deref(), Some("L1"));
        assert_eq!(p.history_for(stream.tenant_id, cream)[0].sample_quantity, None);
        assert!(p.history_for(TenantId::new(), soap).is_empty());
    }

    #[test]
    fn conclusion_status_and_removal_are_tracked() {
        let p = projection();
        let mut stream = Stream::new();
        let cream = ProductId::new(AggregateId::new());
        let soap = ProductId::new(AggregateId::new());
        p.apply_envelope(&stream.created(&[(cream, "Cream"), (soap, "Soap")])).unwrap();

        let (tenant_id, report_id) = (stream.tenant_id, stream.report_id);
        let events = [
            InspectionEvent::ConclusionRecorded(ConclusionRecorded {
                tenant_id,
                report_id,
                line_no: 1,
                conclusion: Some(Conclusion::Accepted),
                remarks: Some("as per standard".to_string()),
                occurred_at: Utc::now(),
            }),
            InspectionEvent::LineRemoved(LineRemoved {
                tenant_id,
                report_id,
                line_no: 2,
                occurred_at: Utc::now(),
            }),
            InspectionEvent::InspectionCompleted(InspectionCompleted {
                tenant_id,
                report_id,
                retention_transfer: None,
                occurred_at: Utc::now(),
            }),
        ];
        for event in events {
            p.apply_envelope(&stream.envelope(event)).unwrap();
        }

        let cream_history = p.history_for(tenant_id, cream);
        assert_eq!(cream_history[0].conclusion, Some(Conclusion::Accepted));
        assert_eq!(cream_history[0].status, InspectionStatus::Completed);
        assert!(p.history_for(tenant_id, soap).is_empty());
    }

    #[test]
    fn duplicate_delivery_is_ignored_and_gaps_rejected() {
        let p = projection();
        let mut stream = Stream::new();
        let cream = ProductId::new(AggregateId::new());
        let created = stream.created(&[(cream, "Cream")]);

        p.apply_envelope(&created).unwrap();
        p.apply_envelope(&created).unwrap();
        assert_eq!(p.history_for(stream.tenant_id, cream).len(), 1);

        stream.seq += 1;
        let gap = stream.envelope(InspectionEvent::LineRemoved(LineRemoved {
            tenant_id: stream.tenant_id,
            report_id: stream.report_id,
            line_no: 1,
            occurred_at: Utc::now(),
        }));
        assert_eq!(
            p.apply_envelope(&gap),
            Err(InspectionHistoryError::NonMonotonicSequence { last: 1, found: 3 })
        );
    }

    #[test]
    fn envelope_tenant_must_match_event() {
        let p = projection();
        let mut stream = Stream::new();
        let mut created = stream.created(&[(ProductId::new(AggregateId::new()), "Cream")]);
        created = created.for_tenant(TenantId::new());
        assert!(matches!(
            p.apply_envelope(&created),
            Err(InspectionHistoryError::TenantIsolation(_))
        ));
    }

    #[test]
    fn rebuild_replays_from_scratch() {
        let mut p = projection();
        let mut stream = Stream::new();
        let cream = ProductId::new(AggregateId::new());
        let created = stream.created(&[(cream, "Cream")]);
        Projection::apply(&mut p, &created);

        p.rebuild_from_scratch(vec![created]).unwrap();
        assert_eq!(p.history_for(stream.tenant_id, cream).len(), 1);
    }
}
