//! Health check endpoint.
//!
//! Mounted as a plain route: the dispatch middleware never sees it.

use crate::state::AppState;
use axum::{routing::get, Router};

/// Health check route at `path`
pub fn routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
