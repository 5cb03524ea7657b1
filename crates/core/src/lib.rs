//! `codecamp-core` — domain foundation for the code camp API.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! camps, their talks, the speakers giving them, and the identifiers that tie
//! them together.

pub mod camp;
pub mod entity;
pub mod error;
pub mod id;
pub mod moniker;
pub mod speaker;
pub mod talk;

pub use camp::{Camp, Location};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CampId, SpeakerId, TalkId};
pub use moniker::Moniker;
pub use speaker::Speaker;
pub use talk::{Talk, TalkDraft};
