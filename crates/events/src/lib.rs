//! Domain events and their distribution.
//!
//! Aggregates emit typed events; committed events are wrapped in an
//! [`EventEnvelope`] and published on an [`EventBus`] so read models such as
//! the product inspection history can follow along.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod projection;

pub use bus::{EventBus, Subscription};
pub use envelope::{Delivery, EventEnvelope};
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use projection::Projection;
