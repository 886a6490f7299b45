//! HTTP routes.
//!
//! API routes are described by [`ApiRoute`] and mounted behind the dispatch
//! middleware by the app builder. Plain routes such as the health check are
//! ordinary axum routers.

pub mod articles;
pub mod health;

use crate::handler::ApiHandler;
use axum::http::Method;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Extra documentation for a path parameter
#[derive(Debug, Clone)]
pub struct PathParameterDoc {
    /// Parameter name in the route pattern
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Example value
    pub example: Option<Value>,
}

/// A route served by an API handler
#[derive(Clone)]
pub struct ApiRoute {
    /// HTTP method
    pub method: Method,
    /// Route pattern relative to the root url, e.g. `/read_articles/:created`
    pub path: &'static str,
    /// Handler called through the dispatch middleware
    pub handler: Arc<dyn ApiHandler>,
    /// Whether the request body is a multipart form
    pub multipart: bool,
    /// Tags overriding the handler's documented tags
    pub tags: Vec<&'static str>,
    /// Path parameter documentation overrides
    pub path_parameters: Vec<PathParameterDoc>,
}

impl ApiRoute {
    /// Describe a route
    pub fn new(method: Method, path: &'static str, handler: impl ApiHandler) -> Self {
        Self {
            method,
            path,
            handler: Arc::new(handler),
            multipart: false,
            tags: Vec::new(),
            path_parameters: Vec::new(),
        }
    }

    /// Describe a GET route
    pub fn get(path: &'static str, handler: impl ApiHandler) -> Self {
        Self::new(Method::GET, path, handler)
    }

    /// Describe a POST route
    pub fn post(path: &'static str, handler: impl ApiHandler) -> Self {
        Self::new(Method::POST, path, handler)
    }

    /// Expect a multipart body
    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Add a documentation tag
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    /// Document a path parameter
    pub fn path_parameter(
        mut self,
        name: &'static str,
        description: &'static str,
        example: Option<Value>,
    ) -> Self {
        self.path_parameters.push(PathParameterDoc {
            name,
            description,
            example,
        });
        self
    }

    /// Documentation override for a path parameter
    pub fn path_parameter_doc(&self, name: &str) -> Option<&PathParameterDoc> {
        self.path_parameters.iter().find(|doc| doc.name == name)
    }
}

impl fmt::Debug for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler", &self.handler.name())
            .field("multipart", &self.multipart)
            .field("tags", &self.tags)
            .finish()
    }
}

/// All API routes of the service
pub fn api_routes() -> Vec<ApiRoute> {
    articles::routes()
}
