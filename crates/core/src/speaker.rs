//! Speaker entity. Speakers are referenced by talks; this system never
//! creates or edits them through the API.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::SpeakerId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    id: SpeakerId,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub company: Option<String>,
    pub company_url: Option<String>,
    pub blog_url: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
}

impl Speaker {
    pub fn new(id: SpeakerId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: SpeakerId) -> Self {
        self.id = id;
        self
    }

    pub fn display_name(&self) -> String {
        match self.middle_name.as_deref() {
            Some(middle) if !middle.trim().is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

impl Entity for Speaker {
    type Id = SpeakerId;

    fn id(&self) -> SpeakerId {
        self.id
    }

    fn is_persisted(&self) -> bool {
        self.id.is_assigned()
    }
}
