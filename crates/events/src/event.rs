use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate.
///
/// Events are immutable, carry a stable dotted type name
/// (`"inventory.inspection.started"`) and a schema version.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
