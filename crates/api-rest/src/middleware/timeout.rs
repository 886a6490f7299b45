//! Request timeout middleware.
//!
//! Bounds the time spent below this layer. A request that runs out of time
//! is answered with `408` and the usual JSON error body.

use crate::error::ErrorBody;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use tracing::warn;

/// Error type reported when a request exceeds its time budget
pub const TIMEOUT_ERROR: &str = "TimeoutError";

/// Middleware function answering `408` once `limit` has elapsed
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(
                method = %method,
                uri = %uri,
                timeout_ms = limit.as_millis() as u64,
                "Request timed out"
            );
            let body = ErrorBody::new(
                TIMEOUT_ERROR,
                format!("request timed out after {}ms", limit.as_millis()),
            );
            (StatusCode::REQUEST_TIMEOUT, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/fast", get(|| async { "done" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(middleware::from_fn_with_state(
                Duration::from_millis(50),
                timeout_middleware,
            ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_gets_json_timeout() {
        let response = app()
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error_type"], TIMEOUT_ERROR);
        assert!(body["error_message"].as_str().unwrap().contains("50ms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_passes_through() {
        let response = app()
            .oneshot(Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
