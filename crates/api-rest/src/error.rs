//! HTTP error handling and conversion.
//!
//! Every failure of an API call ends up as an [`ApiError`], which maps to a
//! status code and an [`ErrorBody`] of the form
//! `{"error_type": ..., "error_message": ...}`.

use crate::arguments::ArgumentSource;
use articles_infrastructure::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Error response body of every API route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Kind of the error
    #[schema(example = "InputDataValidationError")]
    pub error_type: String,

    /// Human-readable message
    pub error_message: String,
}

impl ErrorBody {
    /// Create a new error body
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.error_message)
    }
}

/// Failure to decode the input of a request before any handler runs
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The body (or a multipart part) is not valid JSON
    #[error("{0}")]
    JsonDecode(String),

    /// The multipart stream is malformed
    #[error("{0}")]
    Multipart(String),

    /// The body could not be read, e.g. it exceeds the size limit
    #[error("{0}")]
    BodyRead(String),

    /// Path parameters could not be decoded
    #[error("{0}")]
    PathParams(String),

    /// The query string could not be decoded
    #[error("{0}")]
    QueryParams(String),
}

impl ExtractionError {
    /// Error type name reported to clients
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::JsonDecode(_) => "JsonDecodeError",
            Self::Multipart(_) => "MultipartError",
            Self::BodyRead(_) => "BodyReadError",
            Self::PathParams(_) => "PathParamsError",
            Self::QueryParams(_) => "QueryParamsError",
        }
    }
}

/// Handler parameter wiring errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The same parameter name was registered with two different sources
    #[error("parameter '{name}' is already bound to {existing}, cannot rebind it to {requested}")]
    Conflict {
        /// Parameter name
        name: String,
        /// Source registered first
        existing: ArgumentSource,
        /// Source of the rejected registration
        requested: ArgumentSource,
    },

    /// No source is registered for a declared parameter
    #[error("no argument source registered for parameter '{name}'")]
    Unregistered {
        /// Parameter name
        name: String,
    },

    /// The registered source has no value for this request
    #[error("{kind} has no value for parameter '{name}'")]
    MissingValue {
        /// Parameter name
        name: String,
        /// Source that was consulted
        kind: ArgumentSource,
    },
}

/// Error raised by an API handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The input data was rejected, reported as a client error
    #[error("{0}")]
    Validation(String),

    /// A parameter could not be bound
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// A bound parameter was requested as the wrong kind of value
    #[error("{0}")]
    InvalidArgument(String),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Any other failure
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    /// Create a validation error
    pub fn validation(message: impl fmt::Display) -> Self {
        Self::Validation(message.to_string())
    }

    /// Create an internal error
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::Internal(message.to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error type name reported to clients
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "InputDataValidationError",
            Self::Binding(_) | Self::InvalidArgument(_) => "InvalidHandlerArgument",
            Self::Storage(err) => err.error_type(),
            Self::Internal(_) => "InternalError",
        }
    }
}

impl From<validator::ValidationErrors> for HandlerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type of API handlers
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Outcome of a failed API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request input could not be extracted
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The handler failed
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The handler result could not be encoded as JSON
    #[error("{0}")]
    JsonEncode(#[from] serde_json::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Extraction(_) => StatusCode::BAD_REQUEST,
            Self::Handler(err) => err.status_code(),
            Self::JsonEncode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error type name reported to clients
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Extraction(err) => err.error_type(),
            Self::Handler(err) => err.error_type(),
            Self::JsonEncode(_) => "JsonEncodeError",
        }
    }

    /// Body sent to the client
    pub fn body(&self) -> ErrorBody {
        ErrorBody::new(self.error_type(), self.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
