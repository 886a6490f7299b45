//! Articles REST API
//!
//! This crate provides an Axum-based JSON API for creating and reading
//! articles and attaching files to them. API handlers are plain structs
//! declaring their parameters in a [`handler::Signature`]; a single dispatch
//! middleware decodes each request, binds the declared parameters and turns
//! the outcome into a JSON response.
//!
//! ## Architecture
//!
//! - **app**: Application builder, wiring checks and middleware stack
//! - **arguments**: Parameter name to argument source registry
//! - **handler**: API handler contract and declared signatures
//! - **input**: Request body, path and query extraction
//! - **middleware**: Dispatch, request id and request logging middleware
//! - **docs**: OpenAPI generation from handler signatures and doc strings
//! - **routes**: Article handlers and the health check
//! - **error**: Error types and their JSON representation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use articles_api_rest::{create_app, ApiConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ApiConfig::load()?;
//!     let app = create_app(config.clone()).await?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod arguments;
pub mod config;
pub mod docs;
pub mod error;
pub mod handler;
pub mod input;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use app::{create_app, create_app_with_state};
pub use arguments::{ArgumentSource, ArgumentsManager, Kwargs};
pub use config::ApiConfig;
pub use error::{ApiError, ErrorBody, HandlerError, HandlerResult};
pub use handler::{ApiHandler, ParamType, Reply, Signature};
pub use state::AppState;
