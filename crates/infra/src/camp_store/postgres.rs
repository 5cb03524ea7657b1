//! Postgres-backed camp store.
//!
//! A `ChangeSet` is applied inside one transaction. Any step that the
//! database refuses for data reasons rolls the whole transaction back and the
//! save reports `NotCommitted`:
//!
//! | Condition | SQLSTATE | Outcome |
//! |-----------|----------|---------|
//! | Moniker already used (unique index on `lower(moniker)`) | `23505` | `NotCommitted` |
//! | Talk references a missing camp/speaker | `23503` | `NotCommitted` |
//! | Update/delete matched no row | n/a | `NotCommitted` |
//! | Anything else | any | `RepositoryError` |

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use codecamp_core::{
    Camp, CampId, Entity, Location, Moniker, Speaker, SpeakerId, Talk, TalkDraft, TalkId,
};

use super::change_set::{Change, ChangeSet};
use super::r#trait::{AssignedIds, CampStore, RepositoryError, RepositoryResult, SaveOutcome};
use crate::seed::SeedData;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS speakers (
        id SERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        middle_name TEXT,
        company TEXT,
        company_url TEXT,
        blog_url TEXT,
        twitter TEXT,
        github TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS camps (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        moniker TEXT NOT NULL,
        event_date TIMESTAMP NOT NULL,
        length INTEGER NOT NULL,
        venue_name TEXT,
        address1 TEXT,
        address2 TEXT,
        address3 TEXT,
        city_town TEXT,
        state_province TEXT,
        postal_code TEXT,
        country TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS camps_moniker_key ON camps (lower(moniker))",
    r#"
    CREATE TABLE IF NOT EXISTS talks (
        id SERIAL PRIMARY KEY,
        camp_id INTEGER NOT NULL REFERENCES camps (id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        abstract TEXT NOT NULL,
        level INTEGER NOT NULL,
        speaker_id INTEGER NOT NULL REFERENCES speakers (id)
    )
    "#,
];

const CAMP_COLUMNS: &str = "c.id, c.name, c.moniker, c.event_date, c.length, c.venue_name, \
     c.address1, c.address2, c.address3, c.city_town, c.state_province, c.postal_code, c.country";

const TALK_COLUMNS: &str = "t.id AS talk_id, t.camp_id, t.title, t.abstract, t.level, t.speaker_id, \
     s.first_name, s.last_name, s.middle_name, s.company, s.company_url, s.blog_url, s.twitter, s.github";

const SPEAKER_COLUMNS: &str = "s.id AS speaker_id, s.first_name, s.last_name, s.middle_name, \
     s.company, s.company_url, s.blog_url, s.twitter, s.github";

#[derive(Debug, Clone)]
pub struct PostgresCampStore {
    pool: Arc<PgPool>,
}

impl PostgresCampStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes that do not exist yet.
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Insert `data` (keeping its ids) when the camps table is empty.
    /// Returns whether anything was written.
    pub async fn seed_if_empty(&self, data: &SeedData) -> RepositoryResult<bool> {
        let existing: i64 = sqlx::query("SELECT COUNT(*) AS total FROM camps")
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("seed_count", e))?;
        if existing > 0 || data.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("seed", e))?;
        for speaker in &data.speakers {
            bind_speaker(
                sqlx::query(
                    "INSERT INTO speakers (id, first_name, last_name, middle_name, company, \
                     company_url, blog_url, twitter, github) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                )
                .bind(speaker.id().get()),
                speaker,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_speakers", e))?;
        }
        for camp in &data.camps {
            bind_camp(
                sqlx::query(
                    "INSERT INTO camps (id, name, moniker, event_date, length, venue_name, address1, \
                     address2, address3, city_town, state_province, postal_code, country) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                )
                .bind(camp.id().get()),
                camp,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_camps", e))?;
        }
        for talk in &data.talks {
            sqlx::query(
                "INSERT INTO talks (id, camp_id, title, abstract, level, speaker_id) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(talk.id().get())
            .bind(talk.camp_id().get())
            .bind(&talk.title)
            .bind(&talk.abstract_text)
            .bind(talk.level)
            .bind(talk.speaker_id().get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_talks", e))?;
        }
        for table in ["speakers", "camps", "talks"] {
            sqlx::query(&format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), COALESCE(MAX(id), 1)) FROM {table}"
            ))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_sequences", e))?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("seed", e))?;
        Ok(true)
    }

    async fn load_camps(&self, filter: CampFilter<'_>, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        let rows = match filter {
            CampFilter::All => {
                sqlx::query(&format!("SELECT {CAMP_COLUMNS} FROM camps c ORDER BY c.id"))
                    .fetch_all(&*self.pool)
                    .await
            }
            CampFilter::EventDate(date) => {
                sqlx::query(&format!(
                    "SELECT {CAMP_COLUMNS} FROM camps c WHERE c.event_date::date = $1 ORDER BY c.id"
                ))
                .bind(date)
                .fetch_all(&*self.pool)
                .await
            }
            CampFilter::Moniker(moniker) => {
                sqlx::query(&format!(
                    "SELECT {CAMP_COLUMNS} FROM camps c WHERE lower(c.moniker) = lower($1)"
                ))
                .bind(moniker.trim())
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("load_camps", e))?;

        let camps = rows.iter().map(camp_from_row).collect::<RepositoryResult<Vec<_>>>()?;
        if !include_talks || camps.is_empty() {
            return Ok(camps);
        }

        let ids: Vec<i32> = camps.iter().map(|c| c.id().get()).collect();
        let talk_rows = sqlx::query(&format!(
            "SELECT {TALK_COLUMNS} FROM talks t JOIN speakers s ON s.id = t.speaker_id \
             WHERE t.camp_id = ANY($1) ORDER BY t.id"
        ))
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_camp_talks", e))?;

        let mut by_camp: BTreeMap<CampId, Vec<Talk>> = BTreeMap::new();
        for row in &talk_rows {
            let talk = talk_from_row(row, true)?;
            by_camp.entry(talk.camp_id()).or_default().push(talk);
        }

        Ok(camps
            .into_iter()
            .map(|c| {
                let talks = by_camp.remove(&c.id()).unwrap_or_default();
                c.with_talks(talks)
            })
            .collect())
    }
}

enum CampFilter<'a> {
    All,
    EventDate(NaiveDate),
    Moniker(&'a str),
}

#[async_trait::async_trait]
impl CampStore for PostgresCampStore {
    #[instrument(skip(self), err)]
    async fn get_all_camps(&self, include_talks: bool) -> RepositoryResult<Vec<Camp>> {
        self.load_camps(CampFilter::All, include_talks).await
    }

    #[instrument(skip(self), err)]
    async fn get_all_camps_by_event_date(
        &self,
        date: NaiveDate,
        include_talks: bool,
    ) -> RepositoryResult<Vec<Camp>> {
        self.load_camps(CampFilter::EventDate(date), include_talks).await
    }

    #[instrument(skip(self), err)]
    async fn get_camp(&self, moniker: &str, include_talks: bool) -> RepositoryResult<Option<Camp>> {
        Ok(self
            .load_camps(CampFilter::Moniker(moniker), include_talks)
            .await?
            .into_iter()
            .next())
    }

    #[instrument(skip(self), err)]
    async fn get_talks_by_moniker(
        &self,
        moniker: &str,
        include_speakers: bool,
    ) -> RepositoryResult<Vec<Talk>> {
        let rows = sqlx::query(&format!(
            "SELECT {TALK_COLUMNS} FROM talks t \
             JOIN camps c ON c.id = t.camp_id \
             JOIN speakers s ON s.id = t.speaker_id \
             WHERE lower(c.moniker) = lower($1) ORDER BY t.id"
        ))
        .bind(moniker.trim())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_talks_by_moniker", e))?;

        rows.iter().map(|r| talk_from_row(r, include_speakers)).collect()
    }

    #[instrument(skip(self), err)]
    async fn get_talk_by_moniker(
        &self,
        moniker: &str,
        talk_id: TalkId,
        include_speakers: bool,
    ) -> RepositoryResult<Option<Talk>> {
        let row = sqlx::query(&format!(
            "SELECT {TALK_COLUMNS} FROM talks t \
             JOIN camps c ON c.id = t.camp_id \
             JOIN speakers s ON s.id = t.speaker_id \
             WHERE lower(c.moniker) = lower($1) AND t.id = $2"
        ))
        .bind(moniker.trim())
        .bind(talk_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_talk_by_moniker", e))?;

        row.as_ref().map(|r| talk_from_row(r, include_speakers)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_speakers_by_moniker(&self, moniker: &str) -> RepositoryResult<Vec<Speaker>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT {SPEAKER_COLUMNS} FROM speakers s \
             JOIN talks t ON t.speaker_id = s.id \
             JOIN camps c ON c.id = t.camp_id \
             WHERE lower(c.moniker) = lower($1) ORDER BY speaker_id"
        ))
        .bind(moniker.trim())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_speakers_by_moniker", e))?;

        rows.iter().map(speaker_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn get_speaker(&self, speaker_id: SpeakerId) -> RepositoryResult<Option<Speaker>> {
        let row = sqlx::query(&format!("SELECT {SPEAKER_COLUMNS} FROM speakers s WHERE s.id = $1"))
            .bind(speaker_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_speaker", e))?;

        row.as_ref().map(speaker_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn get_all_speakers(&self) -> RepositoryResult<Vec<Speaker>> {
        let rows = sqlx::query(&format!("SELECT {SPEAKER_COLUMNS} FROM speakers s ORDER BY s.id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_all_speakers", e))?;

        rows.iter().map(speaker_from_row).collect()
    }

    #[instrument(skip(self, changes), fields(changes = changes.len()), err)]
    async fn save_changes(&self, changes: ChangeSet) -> RepositoryResult<SaveOutcome> {
        if changes.is_empty() {
            return Ok(SaveOutcome::NotCommitted);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        let mut assigned = AssignedIds::default();

        for change in changes.into_changes() {
            match apply_change(&mut tx, change, &mut assigned).await {
                Ok(true) => {}
                // Dropping `tx` rolls back everything staged so far.
                Ok(false) => return Ok(SaveOutcome::NotCommitted),
                Err(e) if is_rejection(&e) => {
                    tracing::debug!(error = %e, "save rejected by constraint");
                    return Ok(SaveOutcome::NotCommitted);
                }
                Err(e) => return Err(map_sqlx_error("save_changes", e)),
            }
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(SaveOutcome::Committed(assigned))
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

fn bind_camp<'q>(query: PgQuery<'q>, camp: &'q Camp) -> PgQuery<'q> {
    let loc = &camp.location;
    query
        .bind(&camp.name)
        .bind(camp.moniker.as_str())
        .bind(camp.event_date)
        .bind(camp.length)
        .bind(loc.venue_name.as_deref())
        .bind(loc.address1.as_deref())
        .bind(loc.address2.as_deref())
        .bind(loc.address3.as_deref())
        .bind(loc.city_town.as_deref())
        .bind(loc.state_province.as_deref())
        .bind(loc.postal_code.as_deref())
        .bind(loc.country.as_deref())
}

fn bind_speaker<'q>(query: PgQuery<'q>, speaker: &'q Speaker) -> PgQuery<'q> {
    query
        .bind(&speaker.first_name)
        .bind(&speaker.last_name)
        .bind(speaker.middle_name.as_deref())
        .bind(speaker.company.as_deref())
        .bind(speaker.company_url.as_deref())
        .bind(speaker.blog_url.as_deref())
        .bind(speaker.twitter.as_deref())
        .bind(speaker.github.as_deref())
}

/// Apply one change. `Ok(false)` means the targeted row was not there.
async fn apply_change(
    tx: &mut Transaction<'_, Postgres>,
    change: Change,
    assigned: &mut AssignedIds,
) -> Result<bool, sqlx::Error> {
    match change {
        Change::AddCamp(camp) => {
            let row = bind_camp(
                sqlx::query(
                    "INSERT INTO camps (name, moniker, event_date, length, venue_name, address1, \
                     address2, address3, city_town, state_province, postal_code, country) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
                ),
                &camp,
            )
            .fetch_one(&mut **tx)
            .await?;
            assigned.camps.push(CampId::new(row.try_get("id")?));
            Ok(true)
        }
        Change::UpdateCamp(camp) => {
            let result = bind_camp(
                sqlx::query(
                    "UPDATE camps SET name = $2, moniker = $3, event_date = $4, length = $5, \
                     venue_name = $6, address1 = $7, address2 = $8, address3 = $9, city_town = $10, \
                     state_province = $11, postal_code = $12, country = $13 WHERE id = $1",
                )
                .bind(camp.id().get()),
                &camp,
            )
            .execute(&mut **tx)
            .await?;
            Ok(result.rows_affected() == 1)
        }
        Change::DeleteCamp(camp) => {
            let result = sqlx::query("DELETE FROM camps WHERE id = $1")
                .bind(camp.id().get())
                .execute(&mut **tx)
                .await?;
            Ok(result.rows_affected() == 1)
        }
        Change::AddTalk(talk) => {
            let row = sqlx::query(
                "INSERT INTO talks (camp_id, title, abstract, level, speaker_id) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(talk.camp_id().get())
            .bind(&talk.title)
            .bind(&talk.abstract_text)
            .bind(talk.level)
            .bind(talk.speaker_id().get())
            .fetch_one(&mut **tx)
            .await?;
            assigned.talks.push(TalkId::new(row.try_get("id")?));
            Ok(true)
        }
        Change::UpdateTalk(talk) => {
            let result = sqlx::query(
                "UPDATE talks SET camp_id = $2, title = $3, abstract = $4, level = $5, speaker_id = $6 \
                 WHERE id = $1",
            )
            .bind(talk.id().get())
            .bind(talk.camp_id().get())
            .bind(&talk.title)
            .bind(&talk.abstract_text)
            .bind(talk.level)
            .bind(talk.speaker_id().get())
            .execute(&mut **tx)
            .await?;
            Ok(result.rows_affected() == 1)
        }
        Change::DeleteTalk(talk) => {
            let result = sqlx::query("DELETE FROM talks WHERE id = $1")
                .bind(talk.id().get())
                .execute(&mut **tx)
                .await?;
            Ok(result.rows_affected() == 1)
        }
    }
}

fn camp_from_row(row: &PgRow) -> RepositoryResult<Camp> {
    let corrupt = |e: sqlx::Error| RepositoryError::Corrupt(format!("camp row: {e}"));

    let moniker: String = row.try_get("moniker").map_err(corrupt)?;
    let moniker = Moniker::parse(moniker)
        .map_err(|e| RepositoryError::Corrupt(format!("camp row: {e}")))?;
    let event_date: NaiveDateTime = row.try_get("event_date").map_err(corrupt)?;

    let location = Location {
        venue_name: row.try_get("venue_name").map_err(corrupt)?,
        address1: row.try_get("address1").map_err(corrupt)?,
        address2: row.try_get("address2").map_err(corrupt)?,
        address3: row.try_get("address3").map_err(corrupt)?,
        city_town: row.try_get("city_town").map_err(corrupt)?,
        state_province: row.try_get("state_province").map_err(corrupt)?,
        postal_code: row.try_get("postal_code").map_err(corrupt)?,
        country: row.try_get("country").map_err(corrupt)?,
    };

    Ok(Camp::new(
        row.try_get::<String, _>("name").map_err(corrupt)?,
        moniker,
        event_date,
        row.try_get("length").map_err(corrupt)?,
        location,
    )
    .with_id(CampId::new(row.try_get("id").map_err(corrupt)?)))
}

fn speaker_fields(row: &PgRow, id: SpeakerId) -> Result<Speaker, sqlx::Error> {
    let mut speaker = Speaker::new(
        id,
        row.try_get::<String, _>("first_name")?,
        row.try_get::<String, _>("last_name")?,
    );
    speaker.middle_name = row.try_get("middle_name")?;
    speaker.company = row.try_get("company")?;
    speaker.company_url = row.try_get("company_url")?;
    speaker.blog_url = row.try_get("blog_url")?;
    speaker.twitter = row.try_get("twitter")?;
    speaker.github = row.try_get("github")?;
    Ok(speaker)
}

fn speaker_from_row(row: &PgRow) -> RepositoryResult<Speaker> {
    row.try_get::<i32, _>("speaker_id")
        .and_then(|id| speaker_fields(row, SpeakerId::new(id)))
        .map_err(|e| RepositoryError::Corrupt(format!("speaker row: {e}")))
}

fn talk_from_row(row: &PgRow, include_speaker: bool) -> RepositoryResult<Talk> {
    let read = || -> Result<Talk, sqlx::Error> {
        let speaker_id = SpeakerId::new(row.try_get("speaker_id")?);
        let talk = Talk::restore(
            TalkId::new(row.try_get("talk_id")?),
            CampId::new(row.try_get("camp_id")?),
            speaker_id,
            TalkDraft {
                title: row.try_get("title")?,
                abstract_text: row.try_get("abstract")?,
                level: row.try_get("level")?,
            },
        );
        if include_speaker {
            Ok(talk.with_speaker(speaker_fields(row, speaker_id)?))
        } else {
            Ok(talk)
        }
    };
    read().map_err(|e| RepositoryError::Corrupt(format!("talk row: {e}")))
}

/// Unique and foreign-key violations mean "this change set cannot be committed".
fn is_rejection(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("23505") | Some("23503"))
        }
        _ => false,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            RepositoryError::Query(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable(format!("connection pool unavailable in {}", operation))
        }
        sqlx::Error::Io(e) => RepositoryError::Unavailable(format!("io error in {}: {}", operation, e)),
        _ => RepositoryError::Query(format!("sqlx error in {}: {}", operation, err)),
    }
}
