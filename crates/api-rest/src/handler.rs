//! API handler contract.
//!
//! An API handler declares its parameters up front in a [`Signature`]. The
//! dispatch middleware resolves every declared parameter into [`Kwargs`]
//! before calling the handler, and the doc generator reads the same
//! signature to describe the operation.
//!
//! [`Kwargs`]: crate::arguments::Kwargs

use crate::{arguments::Kwargs, error::HandlerResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use utoipa::{
    openapi::{
        path::{Parameter, ParameterIn},
        schema::{KnownFormat, ObjectBuilder, Schema, SchemaFormat, SchemaType},
        RefOr,
    },
    IntoParams, ToSchema,
};

/// Schema of a single value, e.g. a path parameter
pub type SchemaFn = fn() -> RefOr<Schema>;

/// Named schema of a type, as produced by [`ToSchema::schema`]
pub type NamedSchemaFn = fn() -> (&'static str, RefOr<Schema>);

/// Parameters of a query object, as produced by [`IntoParams::into_params`]
pub type ParamsFn = fn() -> Vec<Parameter>;

/// Declared type of a handler parameter
#[derive(Debug, Clone, Copy)]
pub enum ParamType {
    /// The raw inbound request; resolved without consulting the registry
    RawRequest,
    /// A value without a documented schema, e.g. an app singleton
    Opaque,
    /// A single path value
    Value(SchemaFn),
    /// A JSON document described by a named schema
    Schema(NamedSchemaFn),
    /// A query object expanded into query parameters
    Query(ParamsFn),
}

fn query_params<T: IntoParams>() -> Vec<Parameter> {
    T::into_params(|| Some(ParameterIn::Query))
}

impl ParamType {
    /// A JSON document of type `T`
    pub fn json<T: ToSchema<'static>>() -> Self {
        Self::Schema(T::schema)
    }

    /// A query object of type `T`
    pub fn query<T: IntoParams>() -> Self {
        Self::Query(query_params::<T>)
    }
}

/// String schema with an optional known format
fn string_schema_with(format: Option<KnownFormat>) -> RefOr<Schema> {
    RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(SchemaType::String)
            .format(format.map(SchemaFormat::KnownFormat))
            .build(),
    ))
}

/// Schema of a plain string value
pub fn string_schema() -> RefOr<Schema> {
    string_schema_with(None)
}

/// Schema of an ISO 8601 date (`YYYY-MM-DD`)
pub fn date_schema() -> RefOr<Schema> {
    string_schema_with(Some(KnownFormat::Date))
}

/// Schema of a hyphenated UUID
pub fn uuid_schema() -> RefOr<Schema> {
    string_schema_with(Some(KnownFormat::Uuid))
}

/// One declared handler parameter
#[derive(Debug, Clone, Copy)]
pub struct Param {
    /// Parameter name, the key used for binding
    pub name: &'static str,
    /// Declared type
    pub ty: ParamType,
}

/// Declared shape of a successful response
#[derive(Debug, Clone, Copy, Default)]
pub enum Returns {
    /// A single object
    One(NamedSchemaFn),
    /// A list of objects
    List(NamedSchemaFn),
    /// Nothing documented
    #[default]
    Unspecified,
}

/// Declared parameters and response shape of a handler
#[derive(Debug, Clone, Default)]
pub struct Signature {
    /// Parameters in declaration order
    pub params: Vec<Param>,
    /// Success response
    pub returns: Returns,
}

impl Signature {
    /// Start an empty signature
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter
    pub fn param(mut self, name: &'static str, ty: ParamType) -> Self {
        self.params.push(Param { name, ty });
        self
    }

    /// Declare a single-object response of type `T`
    pub fn returns<T: ToSchema<'static>>(mut self) -> Self {
        self.returns = Returns::One(T::schema);
        self
    }

    /// Declare a list response of `T` items
    pub fn returns_list<T: ToSchema<'static>>(mut self) -> Self {
        self.returns = Returns::List(T::schema);
        self
    }

    /// Look up a declared parameter
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name == name)
    }
}

trait ToJson: Send {
    fn to_json(&self) -> serde_json::Result<String>;
}

impl<T: Serialize + Send> ToJson for T {
    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Successful handler result, serialized by the dispatch middleware
pub struct Reply(Box<dyn ToJson>);

impl Reply {
    /// Wrap a serializable value
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self(Box::new(value))
    }

    /// Encode the wrapped value
    pub fn to_json(&self) -> serde_json::Result<String> {
        self.0.to_json()
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reply")
    }
}

/// A handler wrapped by the dispatch middleware
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Unique handler name, used for registration and logging
    fn name(&self) -> &'static str;

    /// Human-readable documentation.
    ///
    /// The first line is the summary, the remaining lines the description.
    /// A line starting with `:swagger_tags:` lists comma-separated tags.
    fn doc(&self) -> &'static str {
        ""
    }

    /// Declared parameters and response shape
    fn signature(&self) -> Signature;

    /// Run the handler
    async fn call(&self, kwargs: Kwargs) -> HandlerResult<Reply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    #[test]
    fn test_reply_encodes_value() {
        let reply = Reply::json(vec![1, 2, 3]);
        assert_eq!(reply.to_json().unwrap(), "[1,2,3]");
    }

    #[test]
    fn test_reply_encoding_failure() {
        let reply = Reply::json(Unencodable);
        assert!(reply.to_json().is_err());
    }

    #[test]
    fn test_signature_lookup() {
        let signature = Signature::new()
            .param("created", ParamType::Value(date_schema))
            .param("storage", ParamType::Opaque);

        assert!(matches!(
            signature.get("created").map(|param| param.ty),
            Some(ParamType::Value(_))
        ));
        assert!(signature.get("body").is_none());
        assert!(matches!(signature.returns, Returns::Unspecified));
    }
}
