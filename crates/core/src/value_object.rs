//! Value object marker: compared by value, never mutated in place.

/// Marker trait for immutable values such as abilities and roles.
///
/// A value object is replaced, not edited. Two values with equal fields are
/// interchangeable, which is what lets the session engine swap a whole
/// permission snapshot without tracking individual entries.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
