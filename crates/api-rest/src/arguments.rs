//! Handler argument binding.
//!
//! The [`ArgumentsManager`] maps parameter names to the place their value
//! comes from. It is filled once at startup and shared read-only by all
//! requests. For every call the dispatch middleware asks it to resolve each
//! declared parameter of the target handler into [`Kwargs`].
//!
//! Resolution order is fixed:
//! 1. parameters declared as [`ParamType::RawRequest`] get the raw request,
//! 2. names matching a path parameter of the route get the path value,
//! 3. everything else goes through the registered [`ArgumentSource`].

use crate::{
    error::{BindingError, HandlerError, HandlerResult},
    handler::{Param, ParamType, Signature},
    input::{MultipartForm, RawRequest, RequestBody, RequestContext},
};
use axum::{extract::Query, http::Uri};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::{
    any::{type_name, Any},
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::Arc,
};
use tracing::debug;
use validator::Validate;

/// Parameter name bound to the request body
pub const REQUEST_BODY_ARG: &str = "body";

/// Parameter name bound to the query object
pub const QUERY_ARG: &str = "query";

/// Where the value of a registered parameter comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentSource {
    /// The decoded request body
    RequestBody,
    /// A path parameter of the matched route
    PathParameter,
    /// The query string as a whole
    QueryObject,
    /// An application-scoped singleton of the same name
    AppSingleton,
    /// A request-scoped value of the same name
    RequestKey,
}

impl fmt::Display for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RequestBody => "request body",
            Self::PathParameter => "path parameter",
            Self::QueryObject => "query object",
            Self::AppSingleton => "app singleton",
            Self::RequestKey => "request key",
        };
        f.write_str(name)
    }
}

/// Names of the parameters in a route pattern (`/a/:b`, `/a/{b}` or `/a/*b`)
pub fn route_path_parameters(route_path: &str) -> Vec<&str> {
    route_path
        .split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('*'))
                .or_else(|| {
                    segment
                        .strip_prefix('{')
                        .and_then(|rest| rest.strip_suffix('}'))
                        .map(|name| name.trim_start_matches('*'))
                })
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Registry of parameter name to argument source
#[derive(Debug, Clone, Default)]
pub struct ArgumentsManager {
    bindings: HashMap<String, ArgumentSource>,
}

impl ArgumentsManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter name to a source.
    ///
    /// Registering the same binding twice is a no-op; rebinding a name to a
    /// different source fails.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: ArgumentSource,
    ) -> Result<(), BindingError> {
        let name = name.into();

        match self.bindings.get(&name) {
            Some(existing) if *existing == source => Ok(()),
            Some(existing) => Err(BindingError::Conflict {
                name,
                existing: *existing,
                requested: source,
            }),
            None => {
                debug!(parameter = %name, source = %source, "Registered handler argument");
                self.bindings.insert(name, source);
                Ok(())
            }
        }
    }

    /// Bind a parameter to the decoded request body
    pub fn reg_request_body(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.register(name, ArgumentSource::RequestBody)
    }

    /// Bind a parameter to the path parameter of the same name
    pub fn reg_match_info_key(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.register(name, ArgumentSource::PathParameter)
    }

    /// Bind a parameter to the query string
    pub fn reg_query(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.register(name, ArgumentSource::QueryObject)
    }

    /// Bind a parameter to the app singleton of the same name
    pub fn reg_app_key(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.register(name, ArgumentSource::AppSingleton)
    }

    /// Bind a parameter to the request-scoped value of the same name
    pub fn reg_request_key(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.register(name, ArgumentSource::RequestKey)
    }

    /// Source registered for a parameter name
    pub fn source_of(&self, name: &str) -> Option<ArgumentSource> {
        self.bindings.get(name).copied()
    }

    /// Check at startup that every parameter of a handler can be bound
    /// when it is mounted on `route_path`.
    pub fn check_signature(&self, route_path: &str, signature: &Signature) -> Result<(), BindingError> {
        let path_params = route_path_parameters(route_path);

        for param in &signature.params {
            if matches!(param.ty, ParamType::RawRequest) || path_params.contains(&param.name) {
                continue;
            }

            if !self.bindings.contains_key(param.name) {
                return Err(BindingError::Unregistered {
                    name: param.name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Resolve the value of one parameter for the current request
    pub fn resolve(&self, ctx: &RequestContext, param: &Param) -> Result<ArgValue, BindingError> {
        if matches!(param.ty, ParamType::RawRequest) {
            return Ok(ArgValue::RawRequest(Arc::clone(&ctx.raw)));
        }

        if let Some(value) = ctx.input.url_parts.get(param.name) {
            return Ok(ArgValue::PathValue(value.clone()));
        }

        let source = self
            .source_of(param.name)
            .ok_or_else(|| BindingError::Unregistered {
                name: param.name.to_string(),
            })?;

        let missing = || BindingError::MissingValue {
            name: param.name.to_string(),
            kind: source,
        };

        match source {
            ArgumentSource::RequestBody => Ok(ArgValue::Body(ctx.input.request_body.clone())),
            // found above when present
            ArgumentSource::PathParameter => Err(missing()),
            ArgumentSource::QueryObject => Ok(ArgValue::Query(ctx.raw.uri.clone())),
            ArgumentSource::AppSingleton => ctx
                .singletons
                .get(param.name)
                .map(|value| ArgValue::Singleton(Arc::clone(value)))
                .ok_or_else(missing),
            ArgumentSource::RequestKey => ctx
                .scope
                .get(param.name)
                .map(|value| ArgValue::Scoped(value.clone()))
                .ok_or_else(missing),
        }
    }

    /// Resolve every declared parameter of a handler
    pub fn build_kwargs(
        &self,
        handler: &'static str,
        signature: &Signature,
        ctx: &RequestContext,
    ) -> Result<Kwargs, BindingError> {
        let values = signature
            .params
            .iter()
            .map(|param| Ok((param.name, self.resolve(ctx, param)?)))
            .collect::<Result<_, BindingError>>()?;

        Ok(Kwargs { handler, values })
    }
}

/// A resolved parameter value
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// The raw request head
    RawRequest(Arc<RawRequest>),
    /// A path parameter, still undecoded
    PathValue(String),
    /// The decoded request body
    Body(RequestBody),
    /// The request uri, its query string decoded on access
    Query(Uri),
    /// An application-scoped singleton
    Singleton(Arc<dyn Any + Send + Sync>),
    /// A request-scoped value
    Scoped(Value),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::RawRequest(_) => "raw request",
            Self::PathValue(_) => "path value",
            Self::Body(_) => "request body",
            Self::Query(_) => "query object",
            Self::Singleton(_) => "app singleton",
            Self::Scoped(_) => "request key",
        }
    }
}

/// Resolved arguments of one handler call, with typed accessors.
///
/// Decoding failures of client-supplied values are validation errors;
/// asking for a parameter the handler never declared, or as the wrong kind
/// of value, is a wiring defect.
#[derive(Debug)]
pub struct Kwargs {
    handler: &'static str,
    values: HashMap<&'static str, ArgValue>,
}

impl Kwargs {
    /// Name of the handler these arguments were resolved for
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// Raw resolved value of a parameter
    pub fn get(&self, name: &str) -> HandlerResult<&ArgValue> {
        self.values.get(name).ok_or_else(|| {
            HandlerError::InvalidArgument(format!(
                "handler '{}' did not declare parameter '{name}'",
                self.handler
            ))
        })
    }

    fn mismatch(&self, name: &str, value: &ArgValue, expected: &str) -> HandlerError {
        HandlerError::InvalidArgument(format!(
            "parameter '{name}' of handler '{}' is bound to a {}, not a {expected}",
            self.handler,
            value.kind()
        ))
    }

    /// The raw request head
    pub fn raw_request(&self, name: &str) -> HandlerResult<Arc<RawRequest>> {
        match self.get(name)? {
            ArgValue::RawRequest(raw) => Ok(Arc::clone(raw)),
            other => Err(self.mismatch(name, other, "raw request")),
        }
    }

    /// Decode and validate a JSON request body
    pub fn body<T>(&self, name: &str) -> HandlerResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let value = match self.get(name)? {
            ArgValue::Body(RequestBody::Json(value)) => value,
            ArgValue::Body(RequestBody::Absent) => &Value::Null,
            other => return Err(self.mismatch(name, other, "JSON body")),
        };

        let data = T::deserialize(value).map_err(HandlerError::validation)?;
        data.validate()?;
        Ok(data)
    }

    /// A multipart request body
    pub fn form(&self, name: &str) -> HandlerResult<&MultipartForm> {
        match self.get(name)? {
            ArgValue::Body(RequestBody::Multipart(form)) => Ok(form),
            other => Err(self.mismatch(name, other, "multipart form")),
        }
    }

    /// Parse a path parameter
    pub fn path<T>(&self, name: &str) -> HandlerResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name)? {
            ArgValue::PathValue(raw) => raw.parse().map_err(|err| {
                HandlerError::validation(format!("path parameter '{name}' ({raw:?}): {err}"))
            }),
            other => Err(self.mismatch(name, other, "path value")),
        }
    }

    /// Decode and validate the query string into an object
    pub fn query<T>(&self, name: &str) -> HandlerResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let uri = match self.get(name)? {
            ArgValue::Query(uri) => uri,
            other => return Err(self.mismatch(name, other, "query object")),
        };

        let Query(data) = Query::<T>::try_from_uri(uri)
            .map_err(|rejection| HandlerError::validation(rejection.body_text()))?;
        data.validate()?;
        Ok(data)
    }

    /// An application-scoped singleton of type `T`
    pub fn singleton<T>(&self, name: &str) -> HandlerResult<T>
    where
        T: Any + Clone,
    {
        match self.get(name)? {
            ArgValue::Singleton(value) => value.downcast_ref::<T>().cloned().ok_or_else(|| {
                HandlerError::InvalidArgument(format!(
                    "singleton '{name}' is not a {}",
                    type_name::<T>()
                ))
            }),
            other => Err(self.mismatch(name, other, "app singleton")),
        }
    }

    /// A request-scoped value
    pub fn scoped(&self, name: &str) -> HandlerResult<&Value> {
        match self.get(name)? {
            ArgValue::Scoped(value) => Ok(value),
            other => Err(self.mismatch(name, other, "request key")),
        }
    }
}
