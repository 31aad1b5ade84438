//! Entity trait: records that keep their identity while their fields change.

/// An entity owned by (or referenced from) an aggregate.
///
/// Inspection lines, stock locations and ledger movements are entities: two
/// lines with identical quantities are still different lines.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
