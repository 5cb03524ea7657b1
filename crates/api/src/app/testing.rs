//! Test doubles shared by handler tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use codecamp_core::{Camp, Speaker, SpeakerId, Talk, TalkId};
use codecamp_infra::{
    AppConfig, CampStore, ChangeSet, ConfigHandle, InMemoryCampStore, RepositoryError,
    RepositoryResult, SaveOutcome, demo_data,
};

use crate::app::services::AppServices;

/// In-memory store that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct FakeStore {
    inner: InMemoryCampStore,
    reads: AtomicUsize,
    saves: AtomicUsize,
    fail_reads: AtomicBool,
    reject_saves: AtomicBool,
}

impl FakeStore {
    pub fn seeded() -> Self {
        Self {
            inner: InMemoryCampStore::seeded(demo_data()),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn reject_saves(&self) {
        self.reject_saves.store(true, Ordering::SeqCst);
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn read(&self) -> RepositoryResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CampStore for FakeStore {
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        self.read()?;
        self.inner.get_all_camps(include_talks).await
    }

    async fn get_all_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        self.read()?;
        self.inner.get_all_camps_by_event_date(date, include_talks).await
    }

    async fn get_camp(&self, moniker: &str, include_talks: bool) -> RepositoryResult<Option<Camp>> {
        self.read()?;
        self.inner.get_camp(moniker, include_talks).await
    }

    async fn get_talks_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        self.read()?;
        self.inner.get_talks_by_moniker(moniker, include_speakers).await
    }

    async fn get_talk_by_moniker(
        &self,
        moniker: &str,
        talk_id: TalkId,
        include_speakers: bool,
    ) -> RepositoryResult<Option<Talk>> {
        self.read()?;
        self.inner.get_talk_by_moniker(moniker, talk_id, include_speakers).await
    }

    async fn get_speakers_by_moniker(&self, moniker: &str) -> RepositoryResult<Vec<Speaker>> {
        self.read()?;
        self.inner.get_speakers_by_moniker(moniker).await
    }

    async fn get_speaker(&self, speaker_id: SpeakerId) -> RepositoryResult<Option<Speaker>> {
        self.read()?;
        self.inner.get_speaker(speaker_id).await
    }

    async fn get_all_speakers(&self) -> RepositoryResult<Vec<Speaker>> {
        self.read()?;
        self.inner.get_all_speakers().await
    }

    async fn save_changes(&self, changes: ChangeSet) -> RepositoryResult<SaveOutcome> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.reject_saves.load(Ordering::SeqCst) {
            return Ok(SaveOutcome::NotCommitted);
        }
        self.inner.save_changes(changes).await
    }
}

pub fn test_config() -> Arc<ConfigHandle> {
    let config = AppConfig::from_lookup(|_| None).unwrap_or_else(|e| panic!("default config: {e}"));
    Arc::new(ConfigHandle::fixed(config))
}

pub fn services_with(store: FakeStore) -> (Arc<AppServices>, Arc<FakeStore>) {
    let store = Arc::new(store);
    let services = AppServices::new(store.clone(), test_config());
    (Arc::new(services), store)
}

pub async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("read body: {e}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("json body: {e}"))
}
