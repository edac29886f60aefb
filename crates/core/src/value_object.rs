//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two transfers
/// with the same description, containers and amount are equal, even when they
/// sit at different journal positions. Identity and position belong to the
/// journal entry wrapping the value, never to the value itself.
///
/// ```ignore
/// let a = Quantity::from_str("12.5")?;
/// let b = Quantity::from_str("12.50")?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
