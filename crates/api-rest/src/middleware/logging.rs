//! Request logging middleware.

use super::request_id::RequestId;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Middleware for logging HTTP requests and responses.
///
/// Server errors are logged at `error`, client errors at `warn`.
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_default();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    info!(request_id = %request_id, method = %method, uri = %uri, "Incoming request");

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            route = %route,
            status = status.as_u16(),
            duration_ms,
            "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            route = %route,
            status = status.as_u16(),
            duration_ms,
            "Request rejected"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            route = %route,
            status = status.as_u16(),
            duration_ms,
            "Request completed"
        );
    }

    response
}
