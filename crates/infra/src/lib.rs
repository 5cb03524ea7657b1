//! Infrastructure layer: camp storage, seed data, configuration.

pub mod camp_store;
pub mod config;
pub mod seed;

pub use camp_store::{
    AssignedIds, CampStore, Change, ChangeSet, InMemoryCampStore, RepositoryError, RepositoryResult,
    SaveOutcome,
};
#[cfg(feature = "postgres")]
pub use camp_store::PostgresCampStore;
pub use config::{AppConfig, ConfigError, ConfigHandle};
pub use seed::{SeedData, demo_data};
