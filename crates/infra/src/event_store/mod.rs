//! Append-only event store boundary.
//!
//! Tenant-scoped streams of JSON payloads, one stream per aggregate instance,
//! with optimistic concurrency on append.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
