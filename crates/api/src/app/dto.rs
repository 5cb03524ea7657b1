use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use codecamp_core::Moniker;

use crate::app::errors::{ApiError, FieldError};

// -------------------------
// Wire models
// -------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub moniker: String,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub event_date: NaiveDateTime,
    #[serde(default)]
    pub length: i32,

    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location_address1: Option<String>,
    #[serde(default)]
    pub location_address2: Option<String>,
    #[serde(default)]
    pub location_address3: Option<String>,
    #[serde(default)]
    pub location_city_town: Option<String>,
    #[serde(default)]
    pub location_state_province: Option<String>,
    #[serde(default)]
    pub location_postal_code: Option<String>,
    #[serde(default)]
    pub location_country: Option<String>,

    #[serde(default)]
    pub talks: Vec<TalkModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkModel {
    #[serde(default)]
    pub talk_id: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub speaker: Option<SpeakerModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerModel {
    #[serde(default)]
    pub speaker_id: i32,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub company_url: Option<String>,
    #[serde(default)]
    pub blog_url: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default, rename = "gitHub")]
    pub github: Option<String>,
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeTalksQuery {
    #[serde(default)]
    pub include_talks: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub the_date: Option<String>,
    #[serde(default)]
    pub include_talks: bool,
}

// -------------------------
// Validation
// -------------------------

const MAX_TITLE_LEN: usize = 100;
const ABSTRACT_LEN: std::ops::RangeInclusive<usize> = 20..=4000;
const CAMP_LENGTH: std::ops::RangeInclusive<i32> = 1..=100;
const TALK_LEVEL: std::ops::RangeInclusive<i32> = 100..=300;

fn required(errors: &mut Vec<FieldError>, field: &'static str, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("The {label} field is required.")));
        return false;
    }
    true
}

fn finish(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

impl CampModel {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        required(&mut errors, "name", "Name", &self.name);
        if required(&mut errors, "moniker", "Moniker", &self.moniker) {
            if let Err(e) = Moniker::parse(self.moniker.as_str()) {
                errors.push(FieldError::new("moniker", e.to_string()));
            }
        }
        if !CAMP_LENGTH.contains(&self.length) {
            errors.push(FieldError::new(
                "length",
                format!(
                    "The field Length must be between {} and {}.",
                    CAMP_LENGTH.start(),
                    CAMP_LENGTH.end()
                ),
            ));
        }
        finish(errors)
    }
}

impl TalkModel {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if required(&mut errors, "title", "Title", &self.title)
            && self.title.chars().count() > MAX_TITLE_LEN
        {
            errors.push(FieldError::new(
                "title",
                format!("The field Title must be a string with a maximum length of {MAX_TITLE_LEN}."),
            ));
        }
        if required(&mut errors, "abstract", "Abstract", &self.abstract_text)
            && !ABSTRACT_LEN.contains(&self.abstract_text.chars().count())
        {
            errors.push(FieldError::new(
                "abstract",
                format!(
                    "The field Abstract must be a string with a minimum length of {} and a maximum length of {}.",
                    ABSTRACT_LEN.start(),
                    ABSTRACT_LEN.end()
                ),
            ));
        }
        if !TALK_LEVEL.contains(&self.level) {
            errors.push(FieldError::new(
                "level",
                format!(
                    "The field Level must be between {} and {}.",
                    TALK_LEVEL.start(),
                    TALK_LEVEL.end()
                ),
            ));
        }
        finish(errors)
    }
}

// -------------------------
// Dates
// -------------------------

/// Accepts `2018-10-18`, `2018-10-18T09:30:00[.fff]`, `2018-10-18 09:30:00`
/// or an RFC 3339 timestamp (offset dropped).
pub fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn flexible_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn camp(name: &str, moniker: &str, length: i32) -> CampModel {
        CampModel {
            name: name.to_string(),
            moniker: moniker.to_string(),
            length,
            ..CampModel::default()
        }
    }

    fn talk(title: &str, abstract_text: &str, level: i32) -> TalkModel {
        TalkModel {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            level,
            ..TalkModel::default()
        }
    }

    fn fields(err: ApiError) -> Vec<&'static str> {
        match err {
            ApiError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn camp_wire_names_are_camel_case() {
        let model: CampModel = serde_json::from_value(json!({
            "name": "Alabama Code Camp",
            "moniker": "ALA2024",
            "eventDate": "2024-05-04",
            "length": 1,
            "venue": "Civic Center",
            "locationCityTown": "Huntsville"
        }))
        .unwrap();
        assert_eq!(model.event_date.date(), NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(model.location_city_town.as_deref(), Some("Huntsville"));

        let out = serde_json::to_value(&model).unwrap();
        assert_eq!(out["eventDate"], "2024-05-04T00:00:00");
        assert!(out.get("locationAddress1").is_some());
    }

    #[test]
    fn talk_wire_names_match_clients() {
        let model: TalkModel = serde_json::from_value(json!({
            "title": "Rust for C# developers",
            "abstract": "A long enough abstract for validation.",
            "level": 200,
            "speaker": { "speakerId": 2, "gitHub": "octo" }
        }))
        .unwrap();
        assert_eq!(model.abstract_text, "A long enough abstract for validation.");
        let speaker = model.speaker.unwrap();
        assert_eq!(speaker.speaker_id, 2);
        assert_eq!(speaker.github.as_deref(), Some("octo"));
    }

    #[test]
    fn bad_event_date_fails_to_deserialize() {
        let res = serde_json::from_value::<CampModel>(json!({ "eventDate": "yesterday" }));
        assert!(res.is_err());
    }

    #[test]
    fn camp_validation_collects_every_failure() {
        assert!(camp("Atlanta", "ATL2018", 1).validate().is_ok());
        assert_eq!(fields(camp("", " ", 0).validate().unwrap_err()), vec!["name", "moniker", "length"]);
        assert_eq!(fields(camp("x", "ATL", 101).validate().unwrap_err()), vec!["length"]);
        assert_eq!(fields(camp("x", &"M".repeat(65), 1).validate().unwrap_err()), vec!["moniker"]);
    }

    #[test]
    fn talk_validation_bounds() {
        let ok_abstract = "a".repeat(20);
        assert!(talk("Title", &ok_abstract, 100).validate().is_ok());
        assert!(talk("Title", &ok_abstract, 300).validate().is_ok());
        assert_eq!(fields(talk("Title", &ok_abstract, 99).validate().unwrap_err()), vec!["level"]);
        assert_eq!(fields(talk("Title", "too short", 200).validate().unwrap_err()), vec!["abstract"]);
        assert_eq!(
            fields(talk(&"t".repeat(101), &ok_abstract, 200).validate().unwrap_err()),
            vec!["title"]
        );
        assert_eq!(fields(talk("", "", 0).validate().unwrap_err()), vec!["title", "abstract", "level"]);
    }

    #[test]
    fn event_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2018, 10, 18).unwrap();
        for raw in ["2018-10-18", "2018-10-18T00:00:00", "2018-10-18 08:00:00", "2018-10-18T08:00:00Z"] {
            assert_eq!(parse_event_date(raw).map(|d| d.date()), Some(expected), "{raw}");
        }
        assert_eq!(parse_event_date("18/10/2018"), None);
    }
}
