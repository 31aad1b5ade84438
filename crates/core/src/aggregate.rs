//! Aggregate contract shared by inspection reports, orders, products and parties.

use crate::error::{DomainError, DomainResult};

/// Aggregate root: something with an identity and a version that changes only
/// through its own events.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied so far.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation used when appending to a stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// No check (first write of a fresh stream, migrations).
    Any,
    /// Require the stream to be at exactly this version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "stale aggregate version (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Decide/evolve split.
///
/// `handle` inspects the current state and returns the events a command
/// produces without mutating anything; `apply` folds one event into state and
/// bumps the version. Neither performs IO: ledger calls happen in the
/// orchestration layer before the command is built.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Replay a sequence of events onto this instance.
    fn replay<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }
}
