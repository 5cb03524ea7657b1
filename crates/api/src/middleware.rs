use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use codecamp_infra::ConfigHandle;

use crate::app::errors::ApiError;
use crate::version::{self, ApiVersion, VersionError};

#[derive(Clone, Debug)]
pub struct VersionState {
    /// Source of the default version; re-read on every request so a config
    /// reload takes effect immediately.
    pub config: Arc<ConfigHandle>,
    /// Used when the current config names no usable default.
    pub fallback: ApiVersion,
}

impl VersionState {
    fn default_version(&self) -> ApiVersion {
        let configured = self
            .config
            .current()
            .map_err(|e| e.to_string())
            .and_then(|c| version::negotiate(&c.default_api_version).map_err(|e| e.to_string()));
        match configured {
            Ok(v) => v,
            Err(error) => {
                tracing::warn!(%error, fallback = %self.fallback, "configured default API version unusable");
                self.fallback
            }
        }
    }
}

/// Resolve the requested API version into a request extension and stamp
/// `api-supported-versions` on the response, including error responses.
pub async fn api_versioning(
    State(state): State<VersionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let resolved = requested_version(req.headers(), req.uri()).unwrap_or_else(|| Ok(state.default_version()));
    let mut res = match resolved {
        Ok(v) => {
            req.extensions_mut().insert(v);
            next.run(req).await
        }
        Err(e) => ApiError::from(e).into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&version::supported_versions_header()) {
        res.headers_mut()
            .insert(version::SUPPORTED_VERSIONS_HEADER, value);
    }
    res
}

/// The version the client asked for, if any: `X-Version` first, then `ver`.
fn requested_version(headers: &HeaderMap, uri: &Uri) -> Option<Result<ApiVersion, VersionError>> {
    if let Some(raw) = headers.get(version::VERSION_HEADER) {
        return Some(match raw.to_str() {
            Ok(raw) => version::negotiate(raw),
            Err(_) => Err(VersionError::Malformed("<non-ascii header>".to_string())),
        });
    }
    query_version(uri).map(|raw| version::negotiate(&raw))
}

/// Percent-decoded `ver` query parameter, matched case-insensitively.
fn query_version(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(version::VERSION_QUERY_PARAM))
        .map(|(_, value)| value)
        .filter(|value| !value.trim().is_empty())
}
