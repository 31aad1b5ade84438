//! Value object marker: compared by value, never by identity.

/// Marker trait for immutable values such as lot references or movement
/// requests.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct BatchNumber(String);
///
/// impl ValueObject for BatchNumber {}
///
/// assert_eq!(BatchNumber("L1".into()), BatchNumber("L1".into()));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
