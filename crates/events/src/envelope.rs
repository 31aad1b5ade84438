use serde::{Deserialize, Serialize};
use uuid::Uuid;

use batchline_core::{AggregateId, TenantId};

/// How an envelope relates to the last position a consumer applied from the
/// same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Directly follows the last applied position.
    Next,
    /// Already applied; redelivery after a retry or replay.
    Duplicate,
    /// Positions are missing in between, or the position is invalid (0).
    Gap { expected: u64 },
}

/// A committed event with the stream it came from: owning tenant, aggregate
/// and 1-based position within that aggregate's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: String,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Tenant and aggregate; ordering by it then by sequence replays streams.
    pub fn stream_key(&self) -> (TenantId, AggregateId) {
        (self.tenant_id, self.aggregate_id)
    }

    /// Classify this envelope for a consumer whose last applied position in
    /// the stream is `last_applied` (0 when nothing was applied yet).
    pub fn delivery_after(&self, last_applied: u64) -> Delivery {
        let seq = self.sequence_number;
        if seq == last_applied + 1 {
            Delivery::Next
        } else if seq != 0 && seq <= last_applied {
            Delivery::Duplicate
        } else {
            Delivery::Gap {
                expected: last_applied + 1,
            }
        }
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Same event, attributed to another tenant. Only for replaying a stream
    /// into a different tenant's read side.
    pub fn for_tenant(self, tenant_id: TenantId) -> Self {
        Self { tenant_id, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seq: u64) -> EventEnvelope<&'static str> {
        EventEnvelope::new(
            Uuid::now_v7(),
            TenantId::new(),
            AggregateId::new(),
            "inventory.inspection",
            seq,
            "sample_set",
        )
    }

    #[test]
    fn delivery_is_classified_against_the_last_applied_position() {
        assert_eq!(at(1).delivery_after(0), Delivery::Next);
        assert_eq!(at(4).delivery_after(3), Delivery::Next);
        assert_eq!(at(2).delivery_after(3), Delivery::Duplicate);
        assert_eq!(at(3).delivery_after(3), Delivery::Duplicate);
        assert_eq!(at(5).delivery_after(3), Delivery::Gap { expected: 4 });
    }

    #[test]
    fn position_zero_is_never_valid() {
        assert_eq!(at(0).delivery_after(0), Delivery::Gap { expected: 1 });
        assert_eq!(at(0).delivery_after(2), Delivery::Gap { expected: 3 });
    }

    #[test]
    fn retargeting_keeps_stream_position() {
        let original = at(2);
        let other = TenantId::new();
        let moved = original.clone().for_tenant(other);

        assert_eq!(moved.stream_key(), (other, original.aggregate_id()));
        assert_eq!(moved.sequence_number(), 2);
        assert_eq!(moved.event_id(), original.event_id());
        assert_eq!(moved.payload(), &"sample_set");
    }
}
