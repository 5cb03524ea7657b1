//! Demo dataset: one camp, two speakers, two talks.

use chrono::NaiveDate;

use codecamp_core::{Camp, CampId, Entity, Location, Moniker, Speaker, SpeakerId, Talk, TalkDraft, TalkId};

/// Entities to preload into a store. Ids are kept as given.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub camps: Vec<Camp>,
    pub speakers: Vec<Speaker>,
    pub talks: Vec<Talk>,
}

impl SeedData {
    pub fn is_empty(&self) -> bool {
        self.camps.is_empty() && self.speakers.is_empty() && self.talks.is_empty()
    }
}

pub fn demo_data() -> SeedData {
    let camp_id = CampId::new(1);
    let event_date = NaiveDate::from_ymd_opt(2018, 10, 18)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let Ok(moniker) = Moniker::parse("ATL2018") else {
        return SeedData::default();
    };

    let camp = Camp::new(
        "Atlanta Code Camp",
        moniker,
        event_date,
        1,
        Location {
            venue_name: Some("Atlanta Convention Center".to_string()),
            address1: Some("123 Main Street".to_string()),
            city_town: Some("Atlanta".to_string()),
            state_province: Some("GA".to_string()),
            postal_code: Some("12345".to_string()),
            country: Some("USA".to_string()),
            ..Location::default()
        },
    )
    .with_id(camp_id);

    let mut shawn = Speaker::new(SpeakerId::new(1), "Shawn", "Wildermuth");
    shawn.company = Some("Wilder Minds LLC".to_string());
    shawn.company_url = Some("http://wilderminds.com".to_string());
    shawn.blog_url = Some("http://wildermuth.com".to_string());
    shawn.twitter = Some("shawnwildermuth".to_string());
    shawn.github = Some("shawnwildermuth".to_string());

    let mut resa = Speaker::new(SpeakerId::new(2), "Resa", "Wildermuth");
    resa.company = Some("Wilder Minds LLC".to_string());
    resa.company_url = Some("http://wilderminds.com".to_string());
    resa.blog_url = Some("http://shawnandresa.com".to_string());
    resa.twitter = Some("resawildermuth".to_string());
    resa.github = Some("resawildermuth".to_string());

    let talks = vec![
        Talk::restore(
            TalkId::new(1),
            camp_id,
            shawn.id(),
            TalkDraft {
                title: "Entity Framework From Scratch".to_string(),
                abstract_text: "Entity Framework from scratch in an hour. Probably cover it all"
                    .to_string(),
                level: 100,
            },
        ),
        Talk::restore(
            TalkId::new(2),
            camp_id,
            resa.id(),
            TalkDraft {
                title: "Writing Sample Data Made Easy".to_string(),
                abstract_text: "Thinking of good sample data examples is tiring.".to_string(),
                level: 200,
            },
        ),
    ];

    SeedData {
        camps: vec![camp],
        speakers: vec![shawn, resa],
        talks,
    }
}
