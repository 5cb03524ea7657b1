//! Conversion between domain entities and wire models.

use thiserror::Error;

use codecamp_core::{Camp, DomainError, Entity, Location, Moniker, Speaker, Talk, TalkDraft};

use crate::app::dto::{CampModel, SpeakerModel, TalkModel};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot map camp: {0}")]
    Domain(#[from] DomainError),
}

pub trait EntityMapper: Send + Sync {
    fn camp_to_model(&self, camp: &Camp) -> CampModel;

    fn camps_to_models(&self, camps: &[Camp]) -> Vec<CampModel> {
        camps.iter().map(|c| self.camp_to_model(c)).collect()
    }

    fn model_to_camp(&self, model: &CampModel) -> Result<Camp, MappingError>;

    /// Copy the model onto an existing camp. Name, moniker, date and length
    /// always overwrite; location lines only when the model carries them.
    /// Talks are left alone.
    fn merge_camp(&self, model: &CampModel, camp: &mut Camp) -> Result<(), MappingError>;

    fn talk_to_model(&self, talk: &Talk) -> TalkModel;

    fn talks_to_models(&self, talks: &[Talk]) -> Vec<TalkModel> {
        talks.iter().map(|t| self.talk_to_model(t)).collect()
    }

    fn model_to_talk_draft(&self, model: &TalkModel) -> TalkDraft;

    /// Copy title, abstract and level. The speaker is the caller's business.
    fn merge_talk(&self, model: &TalkModel, talk: &mut Talk);

    fn speaker_to_model(&self, speaker: &Speaker) -> SpeakerModel;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMapper;

fn location_of(model: &CampModel) -> Location {
    Location {
        venue_name: model.venue.clone(),
        address1: model.location_address1.clone(),
        address2: model.location_address2.clone(),
        address3: model.location_address3.clone(),
        city_town: model.location_city_town.clone(),
        state_province: model.location_state_province.clone(),
        postal_code: model.location_postal_code.clone(),
        country: model.location_country.clone(),
    }
}

fn overwrite_if_present(target: &mut Option<String>, source: &Option<String>) {
    if source.is_some() {
        target.clone_from(source);
    }
}

impl EntityMapper for DefaultMapper {
    fn camp_to_model(&self, camp: &Camp) -> CampModel {
        let loc = &camp.location;
        CampModel {
            name: camp.name.clone(),
            moniker: camp.moniker.to_string(),
            event_date: camp.event_date,
            length: camp.length,
            venue: loc.venue_name.clone(),
            location_address1: loc.address1.clone(),
            location_address2: loc.address2.clone(),
            location_address3: loc.address3.clone(),
            location_city_town: loc.city_town.clone(),
            location_state_province: loc.state_province.clone(),
            location_postal_code: loc.postal_code.clone(),
            location_country: loc.country.clone(),
            talks: self.talks_to_models(&camp.talks),
        }
    }

    fn model_to_camp(&self, model: &CampModel) -> Result<Camp, MappingError> {
        let moniker = Moniker::parse(model.moniker.as_str())?;
        Ok(Camp::new(
            model.name.trim(),
            moniker,
            model.event_date,
            model.length,
            location_of(model),
        ))
    }

    fn merge_camp(&self, model: &CampModel, camp: &mut Camp) -> Result<(), MappingError> {
        camp.moniker = Moniker::parse(model.moniker.as_str())?;
        camp.name = model.name.trim().to_string();
        camp.event_date = model.event_date;
        camp.length = model.length;

        let incoming = location_of(model);
        let loc = &mut camp.location;
        overwrite_if_present(&mut loc.venue_name, &incoming.venue_name);
        overwrite_if_present(&mut loc.address1, &incoming.address1);
        overwrite_if_present(&mut loc.address2, &incoming.address2);
        overwrite_if_present(&mut loc.address3, &incoming.address3);
        overwrite_if_present(&mut loc.city_town, &incoming.city_town);
        overwrite_if_present(&mut loc.state_province, &incoming.state_province);
        overwrite_if_present(&mut loc.postal_code, &incoming.postal_code);
        overwrite_if_present(&mut loc.country, &incoming.country);
        Ok(())
    }

    fn talk_to_model(&self, talk: &Talk) -> TalkModel {
        TalkModel {
            talk_id: talk.id().get(),
            title: talk.title.clone(),
            abstract_text: talk.abstract_text.clone(),
            level: talk.level,
            speaker: talk.speaker().map(|s| self.speaker_to_model(s)),
        }
    }

    fn model_to_talk_draft(&self, model: &TalkModel) -> TalkDraft {
        TalkDraft {
            title: model.title.clone(),
            abstract_text: model.abstract_text.clone(),
            level: model.level,
        }
    }

    fn merge_talk(&self, model: &TalkModel, talk: &mut Talk) {
        talk.title = model.title.clone();
        talk.abstract_text = model.abstract_text.clone();
        talk.level = model.level;
    }

    fn speaker_to_model(&self, speaker: &Speaker) -> SpeakerModel {
        SpeakerModel {
            speaker_id: speaker.id().get(),
            first_name: speaker.first_name.clone(),
            last_name: speaker.last_name.clone(),
            middle_name: speaker.middle_name.clone(),
            company: speaker.company.clone(),
            company_url: speaker.company_url.clone(),
            blog_url: speaker.blog_url.clone(),
            twitter: speaker.twitter.clone(),
            github: speaker.github.clone(),
        }
    }
}
