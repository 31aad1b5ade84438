use crate::{Event, EventEnvelope};

/// Builds a disposable read model from published envelopes.
///
/// Delivery is at-least-once, so `apply` must tolerate seeing the same
/// envelope twice (track the last sequence number per stream or use upserts).
/// Envelopes of other tenants must never leak into a tenant's view.
pub trait Projection {
    type Ev: Event;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
