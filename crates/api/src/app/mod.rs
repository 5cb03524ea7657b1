//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: store selection and the collaborators handed to handlers
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: wire models, query strings and their validation
//! - `mapping.rs` / `links.rs`: entity <-> wire mapping, `Location` paths
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{self, VersionState};
use crate::version::ApiVersion;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod links;
pub mod mapping;
pub mod routes;
pub mod services;

pub use services::AppServices;

#[cfg(test)]
pub(crate) mod testing;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Requests naming no version get the default from the live config, so a
/// reload changes it; `fallback_version` covers a config that names none
/// this server supports.
pub fn build_app(services: Arc<AppServices>, fallback_version: ApiVersion) -> Router {
    let versioning = VersionState {
        config: services.config.clone(),
        fallback: fallback_version,
    };
    let api = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            versioning,
            middleware::api_versioning,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
