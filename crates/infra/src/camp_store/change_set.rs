//! Unit of work handed to [`super::CampStore::save_changes`].

use codecamp_core::{Camp, Talk};

/// One staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    AddCamp(Camp),
    /// Replace the stored camp with the same id. Talks are not touched.
    UpdateCamp(Camp),
    /// Remove the camp and every talk in it.
    DeleteCamp(Camp),
    AddTalk(Talk),
    UpdateTalk(Talk),
    DeleteTalk(Talk),
}

/// Ordered list of mutations committed together by one save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_camp(mut self, camp: Camp) -> Self {
        self.changes.push(Change::AddCamp(camp));
        self
    }

    pub fn update_camp(mut self, camp: Camp) -> Self {
        self.changes.push(Change::UpdateCamp(camp));
        self
    }

    pub fn delete_camp(mut self, camp: Camp) -> Self {
        self.changes.push(Change::DeleteCamp(camp));
        self
    }

    pub fn add_talk(mut self, talk: Talk) -> Self {
        self.changes.push(Change::AddTalk(talk));
        self
    }

    pub fn update_talk(mut self, talk: Talk) -> Self {
        self.changes.push(Change::UpdateTalk(talk));
        self
    }

    pub fn delete_talk(mut self, talk: Talk) -> Self {
        self.changes.push(Change::DeleteTalk(talk));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}
