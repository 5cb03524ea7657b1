use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::options,
    Router,
};

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/api/operations/reloadconfig", options(reload_config))
}

/// Re-read configuration from the environment. Plain-text body either way.
pub async fn reload_config(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.config.reload() {
        Ok(_) => (StatusCode::OK, "Configuration Reloaded").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "configuration reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
