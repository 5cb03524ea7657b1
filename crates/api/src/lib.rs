//! HTTP API for code camps, their talks and speakers.

pub mod app;
pub mod middleware;
pub mod version;
