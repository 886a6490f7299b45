//! OpenAPI generation for API routes.
//!
//! Operations are derived from each route's handler [`Signature`] and doc
//! string once, at startup. The result lives in an [`ApiSchemaRegistry`];
//! handlers are never touched.

use crate::{
    arguments::{route_path_parameters, ArgumentSource, ArgumentsManager},
    error::ErrorBody,
    handler::{ParamType, Returns, Signature},
    routes::ApiRoute,
};
use axum::http::Method;
use std::collections::BTreeMap;
use utoipa::{
    openapi::{
        path::{
            Operation, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathItemType,
        },
        request_body::RequestBodyBuilder,
        schema::{ArrayBuilder, Schema},
        ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder,
        Ref, RefOr, Required, Response, ResponseBuilder,
    },
    ToSchema,
};

/// Tag used when a doc string declares none
pub const DEFAULT_TAG: &str = "common";

/// Summary used for handlers without a doc string
pub const NO_DESCRIPTION: &str = "no description";

const TAGS_MARKER: &str = ":swagger_tags:";
const APPLICATION_JSON: &str = "application/json";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Documentation parsed from a handler doc string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDoc {
    /// First line
    pub summary: String,
    /// Remaining lines, or the summary when there are none
    pub description: String,
    /// Operation tags
    pub tags: Vec<String>,
}

/// Parse a handler doc string.
///
/// Lines are trimmed and blank lines dropped. The last line starting with
/// `:swagger_tags:` is removed and its comma-separated remainder becomes
/// the tag list.
pub fn parse_handler_doc(doc: &str) -> HandlerDoc {
    let mut lines: Vec<&str> = doc
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut tags = vec![DEFAULT_TAG.to_string()];
    if let Some(index) = lines.iter().rposition(|line| line.starts_with(TAGS_MARKER)) {
        let line = lines.remove(index);
        tags = line[TAGS_MARKER.len()..]
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
    }

    let summary = lines.first().copied().unwrap_or(NO_DESCRIPTION).to_string();
    let description = if lines.len() > 1 {
        lines[1..].join("\n")
    } else {
        summary.clone()
    };

    HandlerDoc {
        summary,
        description,
        tags,
    }
}

/// Convert an axum route pattern (`/a/:b`) to an OpenAPI path (`/a/{b}`)
pub fn openapi_path(route_path: &str) -> String {
    route_path
        .split('/')
        .map(|segment| match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn path_item_type(method: &Method) -> Option<PathItemType> {
    let item_type = match *method {
        Method::GET => PathItemType::Get,
        Method::POST => PathItemType::Post,
        Method::PUT => PathItemType::Put,
        Method::DELETE => PathItemType::Delete,
        Method::PATCH => PathItemType::Patch,
        Method::HEAD => PathItemType::Head,
        Method::OPTIONS => PathItemType::Options,
        Method::TRACE => PathItemType::Trace,
        _ => return None,
    };
    Some(item_type)
}

#[derive(Debug, Clone)]
struct RegisteredOperation {
    path: String,
    method: PathItemType,
    operation: Operation,
}

/// Generated operations keyed by handler name, plus shared component schemas
#[derive(Debug, Clone)]
pub struct ApiSchemaRegistry {
    operations: BTreeMap<&'static str, RegisteredOperation>,
    components: BTreeMap<String, RefOr<Schema>>,
}

impl Default for ApiSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiSchemaRegistry {
    /// Create a registry holding only the error body component
    pub fn new() -> Self {
        let (name, schema) = ErrorBody::schema();
        let mut components = BTreeMap::new();
        components.insert(name.to_string(), schema);

        Self {
            operations: BTreeMap::new(),
            components,
        }
    }

    /// Describe `route`, mounted at `full_path`.
    ///
    /// Routes with a method OpenAPI cannot express are skipped.
    pub fn register(&mut self, route: &ApiRoute, full_path: &str, arguments: &ArgumentsManager) {
        let Some(method) = path_item_type(&route.method) else {
            return;
        };

        let handler = route.handler.as_ref();
        let doc = parse_handler_doc(handler.doc());
        let signature = handler.signature();

        let tags = if route.tags.is_empty() {
            doc.tags
        } else {
            route.tags.iter().map(|tag| tag.to_string()).collect()
        };

        let mut builder = OperationBuilder::new()
            .tags(Some(tags))
            .operation_id(Some(handler.name()))
            .summary(Some(doc.summary))
            .description(Some(doc.description));

        builder = self.describe_parameters(builder, route, full_path, &signature, arguments);
        builder = builder
            .response("200", self.success_response(&signature))
            .response("400", error_response("Bad request"))
            .response("500", error_response("Internal server error"));

        self.operations.insert(
            handler.name(),
            RegisteredOperation {
                path: openapi_path(full_path),
                method,
                operation: builder.build(),
            },
        );
    }

    fn describe_parameters(
        &mut self,
        mut builder: OperationBuilder,
        route: &ApiRoute,
        full_path: &str,
        signature: &Signature,
        arguments: &ArgumentsManager,
    ) -> OperationBuilder {
        let path_params = route_path_parameters(full_path);

        for param in &signature.params {
            let source = arguments.source_of(param.name);

            match param.ty {
                ParamType::Value(schema) if path_params.contains(&param.name) => {
                    let overrides = route.path_parameter_doc(param.name);
                    builder = builder.parameter(
                        ParameterBuilder::new()
                            .name(param.name)
                            .parameter_in(ParameterIn::Path)
                            .required(Required::True)
                            .description(overrides.map(|doc| doc.description))
                            .schema(Some(schema()))
                            .example(overrides.and_then(|doc| doc.example.clone()))
                            .build(),
                    );
                }
                ParamType::Query(params) if source == Some(ArgumentSource::QueryObject) => {
                    for parameter in params() {
                        builder = builder.parameter(parameter);
                    }
                }
                ParamType::Schema(named) if source == Some(ArgumentSource::RequestBody) => {
                    let (name, schema) = named();
                    let (content_type, schema) = if route.multipart {
                        (MULTIPART_FORM_DATA, schema)
                    } else {
                        self.components.insert(name.to_string(), schema);
                        (APPLICATION_JSON, Ref::from_schema_name(name).into())
                    };

                    builder = builder.request_body(Some(
                        RequestBodyBuilder::new()
                            .content(content_type, ContentBuilder::new().schema(schema).build())
                            .required(Some(Required::True))
                            .build(),
                    ));
                }
                _ => {}
            }
        }

        builder
    }

    fn success_response(&mut self, signature: &Signature) -> Response {
        let schema: RefOr<Schema> = match signature.returns {
            Returns::One(named) => {
                let (name, schema) = named();
                self.components.insert(name.to_string(), schema);
                Ref::from_schema_name(name).into()
            }
            Returns::List(named) => {
                let (name, schema) = named();
                self.components.insert(name.to_string(), schema);
                RefOr::T(Schema::Array(
                    ArrayBuilder::new().items(Ref::from_schema_name(name)).build(),
                ))
            }
            Returns::Unspecified => {
                return ResponseBuilder::new()
                    .description("Successful operation")
                    .build()
            }
        };

        ResponseBuilder::new()
            .description("Successful operation")
            .content(APPLICATION_JSON, ContentBuilder::new().schema(schema).build())
            .build()
    }

    /// Operation generated for a handler
    pub fn operation(&self, handler_name: &str) -> Option<&Operation> {
        self.operations
            .get(handler_name)
            .map(|registered| &registered.operation)
    }

    /// Assemble the OpenAPI document
    pub fn build(&self, title: &str, version: &str) -> OpenApi {
        let mut paths = PathsBuilder::new();
        for registered in self.operations.values() {
            paths = paths.path(
                registered.path.clone(),
                PathItem::new(registered.method.clone(), registered.operation.clone()),
            );
        }

        let mut components = ComponentsBuilder::new();
        for (name, schema) in &self.components {
            components = components.schema(name.clone(), schema.clone());
        }

        OpenApiBuilder::new()
            .info(InfoBuilder::new().title(title).version(version).build())
            .paths(paths.build())
            .components(Some(components.build()))
            .build()
    }
}

fn error_response(description: &str) -> Response {
    let (name, _) = ErrorBody::schema();
    ResponseBuilder::new()
        .description(description)
        .content(
            APPLICATION_JSON,
            ContentBuilder::new()
                .schema(Ref::from_schema_name(name))
                .build(),
        )
        .build()
}
