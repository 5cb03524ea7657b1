//! Talk entity: a session inside exactly one camp, given by one speaker.

use serde::{Deserialize, Serialize};

use crate::camp::Camp;
use crate::entity::Entity;
use crate::id::{CampId, SpeakerId, TalkId};
use crate::speaker::Speaker;

/// The talk fields supplied by a client, before the talk is linked to a camp
/// and a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkDraft {
    pub title: String,
    pub abstract_text: String,
    pub level: i32,
}

/// A talk.
///
/// There is no way to build a `Talk` without naming its camp and speaker, so
/// "a talk always has a speaker" holds by construction. `speaker` carries the
/// full speaker record only when a store was asked to include it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Talk {
    id: TalkId,
    camp_id: CampId,
    pub title: String,
    pub abstract_text: String,
    pub level: i32,
    speaker_id: SpeakerId,
    speaker: Option<Speaker>,
}

impl Talk {
    /// Build a new (unsaved) talk for `camp`, given by `speaker`.
    pub fn new(camp: &Camp, speaker: Speaker, draft: TalkDraft) -> Self {
        Self {
            id: TalkId::UNASSIGNED,
            camp_id: camp.id(),
            title: draft.title,
            abstract_text: draft.abstract_text,
            level: draft.level,
            speaker_id: speaker.id(),
            speaker: Some(speaker),
        }
    }

    /// Rebuild a talk from stored columns.
    pub fn restore(id: TalkId, camp_id: CampId, speaker_id: SpeakerId, draft: TalkDraft) -> Self {
        Self {
            id,
            camp_id,
            title: draft.title,
            abstract_text: draft.abstract_text,
            level: draft.level,
            speaker_id,
            speaker: None,
        }
    }

    pub fn with_id(mut self, id: TalkId) -> Self {
        self.id = id;
        self
    }

    pub fn camp_id(&self) -> CampId {
        self.camp_id
    }

    pub fn speaker_id(&self) -> SpeakerId {
        self.speaker_id
    }

    pub fn speaker(&self) -> Option<&Speaker> {
        self.speaker.as_ref()
    }

    /// Point the talk at another speaker.
    pub fn assign_speaker(&mut self, speaker: Speaker) {
        self.speaker_id = speaker.id();
        self.speaker = Some(speaker);
    }

    /// Populate the speaker record. Ignored if it is not this talk's speaker.
    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        if speaker.id() == self.speaker_id {
            self.speaker = Some(speaker);
        }
        self
    }

    pub fn without_speaker(mut self) -> Self {
        self.speaker = None;
        self
    }

    pub fn draft(&self) -> TalkDraft {
        TalkDraft {
            title: self.title.clone(),
            abstract_text: self.abstract_text.clone(),
            level: self.level,
        }
    }
}

impl Entity for Talk {
    type Id = TalkId;

    fn id(&self) -> TalkId {
        self.id
    }

    fn is_persisted(&self) -> bool {
        self.id.is_assigned()
    }
}
