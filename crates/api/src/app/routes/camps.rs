use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use codecamp_infra::{ChangeSet, SaveOutcome};

use crate::app::dto::{self, CampModel, IncludeTalksQuery, SearchQuery};
use crate::app::errors::{ApiError, DATABASE_FAILURE, Disclosure, OrUnexpected};
use crate::app::extract::{JsonBody, QueryParams};
use crate::app::services::AppServices;
use crate::version::{self, ApiVersion};

pub fn router() -> Router {
    Router::new()
        .route("/api/camps", get(list_camps).post(create_camp))
        .route("/api/camps/search", get(search_camps))
        .route(
            "/api/camps/:moniker",
            get(get_camp).put(update_camp).delete(delete_camp),
        )
}

pub async fn list_camps(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(query): QueryParams<IncludeTalksQuery>,
) -> Result<Response, ApiError> {
    let camps = services
        .store
        .get_all_camps(query.include_talks)
        .await
        .or_unexpected(DATABASE_FAILURE)?;
    Ok((StatusCode::OK, Json(services.mapper.camps_to_models(&camps))).into_response())
}

pub async fn get_camp(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(api_version): Extension<ApiVersion>,
    Path(moniker): Path<String>,
) -> Result<Response, ApiError> {
    let variant = version::get_camp_table().resolve(api_version)?;
    let camp = services
        .store
        .get_camp(&moniker, variant.include_talks())
        .await
        .or_unexpected(DATABASE_FAILURE)?
        .ok_or(ApiError::NotFound(None))?;
    Ok((StatusCode::OK, Json(services.mapper.camp_to_model(&camp))).into_response())
}

pub async fn search_camps(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Response, ApiError> {
    // No date means nothing can match.
    let Some(raw) = query.the_date.as_deref().filter(|d| !d.trim().is_empty()) else {
        return Err(ApiError::NotFound(None));
    };
    let Some(date) = dto::parse_event_date(raw) else {
        return Err(ApiError::bad_request(format!("'{raw}' is not a valid date")));
    };

    let camps = services
        .store
        .get_all_camps_by_event_date(date.date(), query.include_talks)
        .await
        .or_unexpected(DATABASE_FAILURE)?;
    if camps.is_empty() {
        return Err(ApiError::NotFound(None));
    }
    Ok((StatusCode::OK, Json(services.mapper.camps_to_models(&camps))).into_response())
}

pub async fn create_camp(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(model): JsonBody<CampModel>,
) -> Result<Response, ApiError> {
    const POLICY: Disclosure = Disclosure::Detailed;
    model.validate()?;

    let moniker = model.moniker.trim();
    let existing = services.store.get_camp(moniker, false).await.or_unexpected(POLICY)?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Moniker in use"));
    }

    let Some(location) = services.links.camp_path(moniker) else {
        return Err(ApiError::bad_request("Could not use current moniker"));
    };

    let camp = services.mapper.model_to_camp(&model).or_unexpected(POLICY)?;
    let outcome = services
        .store
        .save_changes(ChangeSet::new().add_camp(camp.clone()))
        .await
        .or_unexpected(POLICY)?;
    let SaveOutcome::Committed(ids) = outcome else {
        return Err(ApiError::NotCommitted(None));
    };

    let camp = match ids.camps.first() {
        Some(id) => camp.with_id(*id),
        None => camp,
    };
    tracing::info!(moniker = %camp.moniker, "camp created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(services.mapper.camp_to_model(&camp)),
    )
        .into_response())
}

pub async fn update_camp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(moniker): Path<String>,
    JsonBody(model): JsonBody<CampModel>,
) -> Result<Response, ApiError> {
    const POLICY: Disclosure = Disclosure::Detailed;
    model.validate()?;

    let mut camp = services
        .store
        .get_camp(&moniker, false)
        .await
        .or_unexpected(POLICY)?
        .ok_or_else(|| ApiError::not_found(format!("Could not find camp with moniker of {moniker}")))?;

    services.mapper.merge_camp(&model, &mut camp).or_unexpected(POLICY)?;

    let outcome = services
        .store
        .save_changes(ChangeSet::new().update_camp(camp.clone()))
        .await
        .or_unexpected(POLICY)?;
    if !outcome.is_committed() {
        return Err(ApiError::NotCommitted(None));
    }

    tracing::info!(moniker = %moniker, new_moniker = %camp.moniker, "camp updated");
    Ok((StatusCode::OK, Json(services.mapper.camp_to_model(&camp))).into_response())
}

pub async fn delete_camp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(moniker): Path<String>,
) -> Result<Response, ApiError> {
    const POLICY: Disclosure = Disclosure::Detailed;

    let camp = services
        .store
        .get_camp(&moniker, false)
        .await
        .or_unexpected(POLICY)?
        .ok_or_else(|| ApiError::not_found(format!("Could not find camp with moniker of {moniker}")))?;

    let outcome = services
        .store
        .save_changes(ChangeSet::new().delete_camp(camp))
        .await
        .or_unexpected(POLICY)?;
    if !outcome.is_committed() {
        return Err(ApiError::NotCommitted(None));
    }

    tracing::info!(moniker = %moniker, "camp deleted");
    Ok(StatusCode::OK.into_response())
}
