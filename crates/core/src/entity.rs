//! Entity trait: identity that survives a snapshot being replaced.

/// Entity marker + minimal interface.
///
/// The authenticated user is an entity: each detail fetch produces a new
/// value, but the identifier is what the engine compares to decide whether a
/// cached snapshot still belongs to the token's subject.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
