//! HTTP middleware components.
//!
//! This module provides middleware for request/response processing including:
//! - Keyword-argument dispatch of API handlers
//! - Request logging
//! - Request ID generation
//! - Request timeouts answered in JSON

pub mod kwargs;
pub mod logging;
pub mod request_id;
pub mod timeout;

pub use kwargs::{api_endpoint, KwargsHandler};
pub use logging::logging_middleware;
pub use request_id::request_id_middleware;
pub use timeout::timeout_middleware;
