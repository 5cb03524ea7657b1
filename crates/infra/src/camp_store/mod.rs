//! Camp store boundary.
//!
//! Handlers talk to storage through the narrow [`CampStore`] capability so
//! they can be exercised against fakes; mutations travel as a [`ChangeSet`]
//! committed by a single `save_changes` call.

pub mod change_set;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use change_set::{Change, ChangeSet};
pub use in_memory::InMemoryCampStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCampStore;
pub use r#trait::{AssignedIds, CampStore, RepositoryError, RepositoryResult, SaveOutcome};
