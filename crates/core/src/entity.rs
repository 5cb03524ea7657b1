//! Entity trait: identity + continuity across state changes.
//!
//! Camps, talks and speakers are entities: a PUT that renames a camp still
//! updates the *same* camp, because identity lives in the id, not the fields.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether the entity has been committed by a store (and so carries a real id).
    fn is_persisted(&self) -> bool;
}
