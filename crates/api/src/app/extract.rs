//! Request extractors that answer with [`ApiError`] instead of axum's
//! plain-text rejections.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::app::errors::{ApiError, FieldError};

/// JSON request body. A body that parses but does not fit the wire model
/// (wrong type, unreadable date) is a validation failure; anything else
/// wrong with the body is a plain bad request. Both answer 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

/// Query-string parameters. An unreadable query answers 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let detail = rejection.body_text();
    tracing::debug!(%detail, "request body rejected");
    match rejection {
        JsonRejection::JsonDataError(_) => ApiError::Validation(vec![FieldError::new("body", detail)]),
        _ => ApiError::bad_request(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use crate::app::testing::body_json;

    #[derive(Debug, Deserialize)]
    struct Payload {
        length: i32,
    }

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn reject(req: Request) -> (StatusCode, serde_json::Value) {
        let err = JsonBody::<Payload>::from_request(req, &()).await.unwrap_err();
        let res = err.into_response();
        let status = res.status();
        (status, body_json(res).await)
    }

    #[tokio::test]
    async fn accepts_well_formed_body() {
        let JsonBody(payload) = JsonBody::<Payload>::from_request(
            request(Some("application/json"), r#"{"length":2}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(payload.length, 2);
    }

    #[tokio::test]
    async fn wrongly_typed_field_is_a_validation_error() {
        let (status, body) = reject(request(Some("application/json"), r#"{"length":"one"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "body");
    }

    #[tokio::test]
    async fn syntax_error_is_a_json_bad_request() {
        let (status, body) = reject(request(Some("application/json"), "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn unreadable_query_is_a_json_bad_request() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Flags {
            include_talks: bool,
        }

        let req = axum::http::Request::builder()
            .uri("/?include_talks=maybe")
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();
        let err = QueryParams::<Flags>::from_request_parts(&mut parts, &()).await.unwrap_err();
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "bad_request");
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_bad_request() {
        let (status, body) = reject(request(None, r#"{"length":2}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }
}
