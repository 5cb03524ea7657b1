use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::NaiveDate;

use codecamp_core::{Camp, CampId, Entity, Speaker, SpeakerId, Talk, TalkId};

use super::change_set::{Change, ChangeSet};
use super::r#trait::{AssignedIds, CampStore, RepositoryError, RepositoryResult, SaveOutcome};
use crate::seed::SeedData;

#[derive(Debug, Clone, Default)]
struct Tables {
    camps: BTreeMap<CampId, Camp>,
    talks: BTreeMap<TalkId, Talk>,
    speakers: BTreeMap<SpeakerId, Speaker>,
    /// Last id issued per table. Like an identity column, these only move
    /// forward: deleting the newest row never frees its id.
    last_camp_id: i32,
    last_talk_id: i32,
    last_speaker_id: i32,
}

/// Next value after `last`, recording it as issued.
fn issue(last: &mut i32) -> Option<i32> {
    let next = last.checked_add(1)?;
    *last = next;
    Some(next)
}

impl Tables {
    fn find_camp(&self, moniker: &str) -> Option<&Camp> {
        self.camps.values().find(|c| c.moniker.matches(moniker))
    }

    fn moniker_taken(&self, camp: &Camp) -> bool {
        self.camps
            .values()
            .any(|c| c.id() != camp.id() && c.moniker == camp.moniker)
    }

    fn next_camp_id(&mut self) -> Option<CampId> {
        issue(&mut self.last_camp_id).map(CampId::new)
    }

    fn next_talk_id(&mut self) -> Option<TalkId> {
        issue(&mut self.last_talk_id).map(TalkId::new)
    }

    fn next_speaker_id(&mut self) -> Option<SpeakerId> {
        issue(&mut self.last_speaker_id).map(SpeakerId::new)
    }

    fn insert_camp(&mut self, camp: Camp) -> Option<CampId> {
        let id = if camp.is_persisted() { camp.id() } else { self.next_camp_id()? };
        self.last_camp_id = self.last_camp_id.max(id.get());
        self.camps.insert(id, camp.with_id(id).without_talks());
        Some(id)
    }

    fn insert_talk(&mut self, talk: Talk) -> Option<TalkId> {
        let id = if talk.is_persisted() { talk.id() } else { self.next_talk_id()? };
        self.last_talk_id = self.last_talk_id.max(id.get());
        self.talks.insert(id, talk.with_id(id).without_speaker());
        Some(id)
    }

    fn insert_speaker(&mut self, speaker: Speaker) -> Option<Speaker> {
        let id = if speaker.is_persisted() { speaker.id() } else { self.next_speaker_id()? };
        self.last_speaker_id = self.last_speaker_id.max(id.get());
        let speaker = speaker.with_id(id);
        self.speakers.insert(id, speaker.clone());
        Some(speaker)
    }

    fn hydrate_talk(&self, talk: &Talk, include_speakers: bool) -> Talk {
        let talk = talk.clone().without_speaker();
        if !include_speakers {
            return talk;
        }
        match self.speakers.get(&talk.speaker_id()) {
            Some(speaker) => talk.with_speaker(speaker.clone()),
            None => talk,
        }
    }

    fn talks_of(&self, camp_id: CampId, include_speakers: bool) -> Vec<Talk> {
        self.talks
            .values()
            .filter(|t| t.camp_id() == camp_id)
            .map(|t| self.hydrate_talk(t, include_speakers))
            .collect()
    }

    fn hydrate_camp(&self, camp: &Camp, include_talks: bool) -> Camp {
        let camp = camp.clone().without_talks();
        if include_talks {
            let talks = self.talks_of(camp.id(), true);
            camp.with_talks(talks)
        } else {
            camp
        }
    }

    /// Apply one change. Returns `false` if the change cannot be committed.
    fn apply(&mut self, change: Change, assigned: &mut AssignedIds) -> bool {
        match change {
            Change::AddCamp(camp) => {
                if self.moniker_taken(&camp) {
                    return false;
                }
                let Some(id) = self.next_camp_id() else {
                    return false;
                };
                self.camps.insert(id, camp.with_id(id).without_talks());
                assigned.camps.push(id);
                true
            }
            Change::UpdateCamp(camp) => {
                if !self.camps.contains_key(&camp.id()) || self.moniker_taken(&camp) {
                    return false;
                }
                self.camps.insert(camp.id(), camp.without_talks());
                true
            }
            Change::DeleteCamp(camp) => {
                if self.camps.remove(&camp.id()).is_none() {
                    return false;
                }
                self.talks.retain(|_, t| t.camp_id() != camp.id());
                true
            }
            Change::AddTalk(talk) => {
                if !self.talk_links_resolve(&talk) {
                    return false;
                }
                let Some(id) = self.next_talk_id() else {
                    return false;
                };
                self.talks.insert(id, talk.with_id(id).without_speaker());
                assigned.talks.push(id);
                true
            }
            Change::UpdateTalk(talk) => {
                if !self.talks.contains_key(&talk.id()) || !self.talk_links_resolve(&talk) {
                    return false;
                }
                self.talks.insert(talk.id(), talk.without_speaker());
                true
            }
            Change::DeleteTalk(talk) => self.talks.remove(&talk.id()).is_some(),
        }
    }

    fn talk_links_resolve(&self, talk: &Talk) -> bool {
        self.camps.contains_key(&talk.camp_id()) && self.speakers.contains_key(&talk.speaker_id())
    }
}

/// In-memory camp store.
///
/// Intended for tests/dev. A save works on a copy of the tables and swaps it
/// in only when every change applied, so a failed save leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryCampStore {
    tables: RwLock<Tables>,
}

impl InMemoryCampStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store preloaded with `data`. Entities keep their ids; any
    /// entity without one is given the next id.
    pub fn seeded(data: SeedData) -> Self {
        let mut tables = Tables::default();
        let mut skipped = 0usize;
        for speaker in data.speakers {
            skipped += usize::from(tables.insert_speaker(speaker).is_none());
        }
        for camp in data.camps {
            skipped += usize::from(tables.insert_camp(camp).is_none());
        }
        for talk in data.talks {
            skipped += usize::from(tables.insert_talk(talk).is_none());
        }
        if skipped > 0 {
            tracing::warn!(skipped, "seed rows dropped: id space exhausted");
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Register a speaker directly (speakers are not managed through the API).
    pub fn insert_speaker(&self, speaker: Speaker) -> RepositoryResult<Speaker> {
        self.write()?
            .insert_speaker(speaker)
            .ok_or_else(|| RepositoryError::Query("speaker id space exhausted".to_string()))
    }

    fn read(&self) -> RepositoryResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> RepositoryResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CampStore for InMemoryCampStore {
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        let tables = self.read()?;
        Ok(tables
            .camps
            .values()
            .map(|c| tables.hydrate_camp(c, include_talks))
            .collect())
    }

    async fn get_all_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        let tables = self.read()?;
        Ok(tables
            .camps
            .values()
            .filter(|c| c.event_day() == date)
            .map(|c| tables.hydrate_camp(c, include_talks))
            .collect())
    }

    async fn get_camp(&self, moniker: &str, include_talks: bool) -> RepositoryResult<Option<Camp>> {
        let tables = self.read()?;
        Ok(tables
            .find_camp(moniker)
            .map(|c| tables.hydrate_camp(c, include_talks)))
    }

    async fn get_talks_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        let tables = self.read()?;
        Ok(match tables.find_camp(moniker) {
            Some(camp) => tables.talks_of(camp.id(), include_speakers),
            None => Vec::new(),
        })
    }

    async fn get_talk_by_moniker(
        &self,
        moniker: &str,
        talk_id: TalkId,
        include_speakers: bool,
    ) -> RepositoryResult<Option<Talk>> {
        let tables = self.read()?;
        let Some(camp) = tables.find_camp(moniker) else {
            return Ok(None);
        };
        Ok(tables
            .talks
            .get(&talk_id)
            .filter(|t| t.camp_id() == camp.id())
            .map(|t| tables.hydrate_talk(t, include_speakers)))
    }

    async fn get_speakers_by_moniker(&self, moniker: &str) -> RepositoryResult<Vec<Speaker>> {
        let tables = self.read()?;
        let Some(camp) = tables.find_camp(moniker) else {
            return Ok(Vec::new());
        };
        let ids: BTreeSet<SpeakerId> = tables
            .talks
            .values()
            .filter(|t| t.camp_id() == camp.id())
            .map(|t| t.speaker_id())
            .collect();
        Ok(ids
            .iter()
            .filter_map(|id| tables.speakers.get(id).cloned())
            .collect())
    }

    async fn get_speaker(&self, speaker_id: SpeakerId) -> RepositoryResult<Option<Speaker>> {
        Ok(self.read()?.speakers.get(&speaker_id).cloned())
    }

    async fn get_all_speakers(&self) -> RepositoryResult<Vec<Speaker>> {
        Ok(self.read()?.speakers.values().cloned().collect())
    }

    async fn save_changes(&self, changes: ChangeSet) -> RepositoryResult<SaveOutcome> {
        if changes.is_empty() {
            return Ok(SaveOutcome::NotCommitted);
        }

        let mut tables = self.write()?;
        let mut staged = tables.clone();
        let mut assigned = AssignedIds::default();
        let count = changes.len();

        for change in changes.into_changes() {
            if !staged.apply(change, &mut assigned) {
                tracing::debug!(changes = count, "in-memory save rejected; nothing committed");
                return Ok(SaveOutcome::NotCommitted);
            }
        }

        *tables = staged;
        tracing::debug!(changes = count, "in-memory save committed");
        Ok(SaveOutcome::Committed(assigned))
    }
}
