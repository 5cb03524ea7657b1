use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::version::VersionError;

/// What a 500 tells the client about the underlying failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    /// Fixed message; the detail only goes to the log.
    Generic(&'static str),
    /// The failure's own text.
    Detailed,
}

pub const DATABASE_FAILURE: Disclosure = Disclosure::Generic("Database Failure");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound(Option<String>),

    /// The request body failed wire-model validation.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// A handler-level precondition rejected the request.
    #[error("{0}")]
    BadRequest(String),

    /// The store declined to commit the change set.
    #[error("changes were not saved")]
    NotCommitted(Option<String>),

    #[error("{0}")]
    UnsupportedVersion(#[from] VersionError),

    #[error("{detail}")]
    Unexpected { detail: String, disclosure: Disclosure },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(Some(message.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_committed(message: impl Into<String>) -> Self {
        Self::NotCommitted(Some(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound(msg) => json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                msg.unwrap_or_else(|| "not found".to_string()),
            ),
            ApiError::Validation(fields) => validation_error(fields),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotCommitted(msg) => {
                tracing::warn!(reason = msg.as_deref().unwrap_or("-"), "changes not committed");
                json_error(
                    StatusCode::BAD_REQUEST,
                    "persistence_failure",
                    msg.unwrap_or_else(|| "bad request".to_string()),
                )
            }
            ApiError::UnsupportedVersion(e) => {
                json_error(StatusCode::BAD_REQUEST, "unsupported_api_version", e.to_string())
            }
            ApiError::Unexpected { detail, disclosure } => {
                tracing::error!(%detail, "request failed");
                let message = match disclosure {
                    Disclosure::Generic(msg) => msg.to_string(),
                    Disclosure::Detailed => detail,
                };
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

/// Turn any displayable failure into an [`ApiError::Unexpected`] carrying
/// the operation's disclosure policy.
pub trait OrUnexpected<T> {
    fn or_unexpected(self, disclosure: Disclosure) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> OrUnexpected<T> for Result<T, E> {
    fn or_unexpected(self, disclosure: Disclosure) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Unexpected {
            detail: e.to_string(),
            disclosure,
        })
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn validation_error(fields: Vec<FieldError>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": "One or more validation errors occurred.",
            "details": fields,
        })),
    )
        .into_response()
}
