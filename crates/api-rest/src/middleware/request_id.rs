//! Request ID middleware.
//!
//! Every request gets an id, taken from the `x-request-id` header when the
//! client sent one. The id is echoed in the response and exposed to API
//! handlers as the request-scoped value `request_id`.

use crate::input::RequestScope;
use axum::{
    body::Body,
    http::{HeaderValue, Request, Response},
    middleware::Next,
};
use uuid::Uuid;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-scoped key the id is stored under
pub const REQUEST_ID_KEY: &str = "request_id";

/// Request id stored in the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Middleware function to add request ID
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response<Body> {
    // Generate or use existing request ID
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Store in extensions
    let mut scope = req
        .extensions()
        .get::<RequestScope>()
        .cloned()
        .unwrap_or_default();
    scope.insert(REQUEST_ID_KEY, request_id.clone());

    req.extensions_mut().insert(scope);
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
