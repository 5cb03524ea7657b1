use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use codecamp_core::{Entity, SpeakerId, Talk, TalkId};
use codecamp_infra::{ChangeSet, SaveOutcome};

use crate::app::dto::TalkModel;
use crate::app::errors::{ApiError, Disclosure, OrUnexpected};
use crate::app::extract::JsonBody;
use crate::app::services::AppServices;

const POLICY: Disclosure = Disclosure::Detailed;

pub fn router() -> Router {
    Router::new()
        .route("/api/camps/:moniker/talks", get(list_talks).post(create_talk))
        .route(
            "/api/camps/:moniker/talks/:id",
            get(get_talk).put(update_talk).delete(delete_talk),
        )
}

/// Talk ids are integers; anything else does not name a talk route.
fn talk_id(raw: &str) -> Result<TalkId, ApiError> {
    raw.parse::<TalkId>().map_err(|_| ApiError::NotFound(None))
}

pub async fn list_talks(
    Extension(services): Extension<Arc<AppServices>>,
    Path(moniker): Path<String>,
) -> Result<Response, ApiError> {
    let talks = services
        .store
        .get_talks_by_moniker(&moniker, true)
        .await
        .or_unexpected(POLICY)?;
    Ok((StatusCode::OK, Json(services.mapper.talks_to_models(&talks))).into_response())
}

pub async fn get_talk(
    Extension(services): Extension<Arc<AppServices>>,
    Path((moniker, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let id = talk_id(&id)?;
    let talk = services
        .store
        .get_talk_by_moniker(&moniker, id, true)
        .await
        .or_unexpected(POLICY)?
        .ok_or_else(|| ApiError::not_found("Talk not found"))?;
    Ok((StatusCode::OK, Json(services.mapper.talk_to_model(&talk))).into_response())
}

pub async fn create_talk(
    Extension(services): Extension<Arc<AppServices>>,
    Path(moniker): Path<String>,
    JsonBody(model): JsonBody<TalkModel>,
) -> Result<Response, ApiError> {
    model.validate()?;

    let Some(camp) = services.store.get_camp(&moniker, false).await.or_unexpected(POLICY)? else {
        return Err(ApiError::bad_request("Camp does not exist"));
    };

    let draft = services.mapper.model_to_talk_draft(&model);

    let Some(speaker_ref) = model.speaker.as_ref() else {
        return Err(ApiError::bad_request("Speaker ID is required"));
    };
    let Some(speaker) = services
        .store
        .get_speaker(SpeakerId::new(speaker_ref.speaker_id))
        .await
        .or_unexpected(POLICY)?
    else {
        return Err(ApiError::bad_request("Speaker could not be found"));
    };

    let talk = Talk::new(&camp, speaker, draft);
    let outcome = services
        .store
        .save_changes(ChangeSet::new().add_talk(talk.clone()))
        .await
        .or_unexpected(POLICY)?;
    let SaveOutcome::Committed(ids) = outcome else {
        return Err(ApiError::not_committed(format!("Failed to save new Talk moniker {moniker}")));
    };

    let talk = match ids.talks.first() {
        Some(id) => talk.with_id(*id),
        None => talk,
    };
    tracing::info!(moniker = %moniker, talk_id = %talk.id(), "talk created");

    let body = Json(services.mapper.talk_to_model(&talk));
    match services.links.talk_path(&moniker, talk.id()) {
        Some(location) => Ok((StatusCode::CREATED, [(header::LOCATION, location)], body).into_response()),
        None => {
            tracing::warn!(moniker = %moniker, talk_id = %talk.id(), "no location for created talk");
            Ok((StatusCode::CREATED, body).into_response())
        }
    }
}

pub async fn update_talk(
    Extension(services): Extension<Arc<AppServices>>,
    Path((moniker, id)): Path<(String, String)>,
    JsonBody(model): JsonBody<TalkModel>,
) -> Result<Response, ApiError> {
    let id = talk_id(&id)?;
    model.validate()?;

    let mut talk = services
        .store
        .get_talk_by_moniker(&moniker, id, true)
        .await
        .or_unexpected(POLICY)?
        .ok_or_else(|| ApiError::not_found("Couldn't find the talk"))?;

    services.mapper.merge_talk(&model, &mut talk);

    if let Some(speaker_ref) = model.speaker.as_ref() {
        let speaker = services
            .store
            .get_speaker(SpeakerId::new(speaker_ref.speaker_id))
            .await
            .or_unexpected(POLICY)?;
        if let Some(speaker) = speaker {
            talk.assign_speaker(speaker);
        }
    }

    let outcome = services
        .store
        .save_changes(ChangeSet::new().update_talk(talk.clone()))
        .await
        .or_unexpected(POLICY)?;
    if !outcome.is_committed() {
        return Err(ApiError::not_committed("failed to update database"));
    }

    tracing::info!(moniker = %moniker, talk_id = %id, "talk updated");
    Ok((StatusCode::OK, Json(services.mapper.talk_to_model(&talk))).into_response())
}

pub async fn delete_talk(
    Extension(services): Extension<Arc<AppServices>>,
    Path((moniker, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let id = talk_id(&id)?;

    let talk = services
        .store
        .get_talk_by_moniker(&moniker, id, false)
        .await
        .or_unexpected(POLICY)?
        .ok_or_else(|| ApiError::not_found("Failed to find the talk to delete"))?;

    let outcome = services
        .store
        .save_changes(ChangeSet::new().delete_talk(talk))
        .await
        .or_unexpected(POLICY)?;
    if !outcome.is_committed() {
        return Err(ApiError::not_committed("Failed to delete talk"));
    }

    tracing::info!(moniker = %moniker, talk_id = %id, "talk deleted");
    Ok(StatusCode::OK.into_response())
}
