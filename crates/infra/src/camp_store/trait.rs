use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use codecamp_core::{Camp, CampId, Speaker, SpeakerId, Talk, TalkId};

use super::change_set::ChangeSet;

/// Errors raised by a camp store.
///
/// A `RepositoryError` always means "something unexpected happened while
/// talking to storage". Expected outcomes (a missing camp, a save that was not
/// committed) are expressed through return values instead.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Ids handed out by a committed save, in the order the adds were staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignedIds {
    pub camps: Vec<CampId>,
    pub talks: Vec<TalkId>,
}

/// Result of [`CampStore::save_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Every staged change was durably applied.
    Committed(AssignedIds),
    /// Nothing was written (empty change set, vanished row, uniqueness clash).
    NotCommitted,
}

impl SaveOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SaveOutcome::Committed(_))
    }

    pub fn assigned(&self) -> Option<&AssignedIds> {
        match self {
            SaveOutcome::Committed(ids) => Some(ids),
            SaveOutcome::NotCommitted => None,
        }
    }
}

/// Data access for camps, their talks and the speakers giving them.
///
/// Reads return `None`/empty collections when nothing matches. Writes are
/// staged in a [`ChangeSet`] and applied by a single `save_changes` call, all
/// or nothing. Monikers are matched case-insensitively.
#[async_trait::async_trait]
pub trait CampStore: Send + Sync {
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>>;

    /// Camps whose event starts on `date` (time of day ignored).
    async fn get_all_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>>;

    /// With `include_talks`, talks come back with their speakers populated.
    async fn get_camp(&self, moniker: &str, include_talks: bool) -> RepositoryResult<Option<Camp>>;

    /// Empty when the camp does not exist.
    async fn get_talks_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>>;

    async fn get_talk_by_moniker(
        &self,
        moniker: &str,
        talk_id: TalkId,
        include_speakers: bool,
    ) -> RepositoryResult<Option<Talk>>;

    /// Distinct speakers of a camp's talks.
    async fn get_speakers_by_moniker(&self, moniker: &str) -> RepositoryResult<Vec<Speaker>>;

    async fn get_speaker(&self, speaker_id: SpeakerId) -> RepositoryResult<Option<Speaker>>;

    async fn get_all_speakers(&self) -> RepositoryResult<Vec<Speaker>>;

    async fn save_changes(&self, changes: ChangeSet) -> RepositoryResult<SaveOutcome>;
}

#[async_trait::async_trait]
impl<S> CampStore for Arc<S>
where
    S: CampStore + ?Sized,
{
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        (**self).get_all_camps(include_talks).await
    }

    async fn get_all_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        (**self).get_all_camps_by_event_date(date, include_talks).await
    }

    async fn get_camp(&self, moniker: &str, include_talks: bool) -> RepositoryResult<Option<Camp>> {
        (**self).get_camp(moniker, include_talks).await
    }

    async fn get_talks_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        (**self).get_talks_by_moniker(moniker, include_speakers).await
    }

    async fn get_talk_by_moniker(
        &self,
        moniker: &str,
        talk_id: TalkId,
        include_speakers: bool,
    ) -> RepositoryResult<Option<Talk>> {
        (**self).get_talk_by_moniker(moniker, talk_id, include_speakers).await
    }

    async fn get_speakers_by_moniker(&self, moniker: &str) -> RepositoryResult<Vec<Speaker>> {
        (**self).get_speakers_by_moniker(moniker).await
    }

    async fn get_speaker(&self, speaker_id: SpeakerId) -> RepositoryResult<Option<Speaker>> {
        (**self).get_speaker(speaker_id).await
    }

    async fn get_all_speakers(&self) -> RepositoryResult<Vec<Speaker>> {
        (**self).get_all_speakers().await
    }

    async fn save_changes(&self, changes: ChangeSet) -> RepositoryResult<SaveOutcome> {
        (**self).save_changes(changes).await
    }
}
