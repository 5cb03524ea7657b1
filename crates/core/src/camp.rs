//! Camp entity: a conference event keyed by its moniker.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::CampId;
use crate::moniker::Moniker;
use crate::talk::Talk;

/// Where a camp takes place. Every line is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub venue_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city_town: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// A conference event.
///
/// `talks` is only populated when a store is asked to include them; an empty
/// vector does not mean the camp has no talks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camp {
    id: CampId,
    pub name: String,
    pub moniker: Moniker,
    pub event_date: NaiveDateTime,
    /// Duration in days.
    pub length: i32,
    pub location: Location,
    pub talks: Vec<Talk>,
}

impl Camp {
    /// Build a camp that has not been saved yet.
    pub fn new(
        name: impl Into<String>,
        moniker: Moniker,
        event_date: NaiveDateTime,
        length: i32,
        location: Location,
    ) -> Self {
        Self {
            id: CampId::UNASSIGNED,
            name: name.into(),
            moniker,
            event_date,
            length,
            location,
            talks: Vec::new(),
        }
    }

    /// Attach the id handed out by a store.
    pub fn with_id(mut self, id: CampId) -> Self {
        self.id = id;
        self
    }

    pub fn with_talks(mut self, talks: Vec<Talk>) -> Self {
        self.talks = talks;
        self
    }

    pub fn without_talks(mut self) -> Self {
        self.talks.clear();
        self
    }

    /// Calendar day the camp starts on (used by date search).
    pub fn event_day(&self) -> NaiveDate {
        self.event_date.date()
    }
}

impl Entity for Camp {
    type Id = CampId;

    fn id(&self) -> CampId {
        self.id
    }

    fn is_persisted(&self) -> bool {
        self.id.is_assigned()
    }
}
