use axum::Router;

pub mod camps;
pub mod operations;
pub mod system;
pub mod talks;

/// Router for every versioned `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(camps::router())
        .merge(talks::router())
        .merge(operations::router())
}
