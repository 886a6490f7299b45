//! Application builder.
//!
//! Assembles the argument registry, the dispatch middleware, the API and
//! plain routes, the generated OpenAPI document and the middleware stack
//! into an Axum router. Every wiring mistake is reported here, before the
//! server accepts a connection.

use crate::{
    arguments::{ArgumentSource, ArgumentsManager, QUERY_ARG, REQUEST_BODY_ARG},
    config::ApiConfig,
    docs::ApiSchemaRegistry,
    middleware::{
        api_endpoint, logging_middleware, request_id::REQUEST_ID_KEY, request_id_middleware,
        timeout_middleware, KwargsHandler,
    },
    routes::{self, ApiRoute},
    state::{AppState, STORAGE_KEY},
};
use anyhow::Context;
use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::openapi::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the application router with in-memory storage
pub async fn create_app(config: ApiConfig) -> anyhow::Result<Router> {
    create_app_with_state(AppState::new(config))
}

/// Create the application router around an existing state
pub fn create_app_with_state(state: AppState) -> anyhow::Result<Router> {
    let config = Arc::clone(&state.config);
    let api_routes = routes::api_routes();

    let arguments = default_arguments()?;
    let mut kwargs = KwargsHandler::new(arguments, config.max_body_size);
    let mut docs = ApiSchemaRegistry::new();

    for route in &api_routes {
        let full_path = config.api_path(route.path);
        check_route(route, &full_path, kwargs.arguments(), &state)?;

        let name = route.handler.name();
        if route.multipart {
            kwargs.register_multipart(name);
        } else {
            kwargs.register_json_api(name);
        }

        docs.register(route, &full_path, kwargs.arguments());
    }

    let kwargs = Arc::new(kwargs);
    let mut api = Router::new();
    for route in api_routes {
        let full_path = config.api_path(route.path);
        info!(
            method = %route.method,
            path = %full_path,
            handler = route.handler.name(),
            "Mounting API route"
        );
        api = api.route(
            &full_path,
            api_endpoint(&route.method, Arc::clone(&kwargs), route.handler)?,
        );
    }

    let mut app = api
        .merge(routes::health::routes(&config.health_check_url))
        .with_state(state);

    if config.enable_swagger {
        let openapi = docs.build(&config.app_name, env!("CARGO_PKG_VERSION"));
        app = app.merge(swagger_ui(&config, openapi));
    }

    let cors = build_cors_layer(&config)?;

    let app = app
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(
            ServiceBuilder::new()
                // Tracing
                .layer(TraceLayer::new_for_http())
                // Compression
                .layer(CompressionLayer::new())
                // CORS
                .layer(cors)
                // Timeout
                .layer(middleware::from_fn_with_state(
                    config.request_timeout(),
                    timeout_middleware,
                ))
                // Custom middleware
                .layer(middleware::from_fn(request_id_middleware))
                .layer(middleware::from_fn(logging_middleware)),
        );

    Ok(app)
}

/// Argument bindings shared by all API handlers
pub fn default_arguments() -> anyhow::Result<ArgumentsManager> {
    let mut arguments = ArgumentsManager::new();
    arguments.reg_request_body(REQUEST_BODY_ARG)?;
    arguments.reg_query(QUERY_ARG)?;
    arguments.reg_match_info_key("created")?;
    arguments.reg_app_key(STORAGE_KEY)?;
    arguments.reg_request_key(REQUEST_ID_KEY)?;
    Ok(arguments)
}

/// Fail fast when a handler parameter cannot be bound on its route
fn check_route(
    route: &ApiRoute,
    full_path: &str,
    arguments: &ArgumentsManager,
    state: &AppState,
) -> anyhow::Result<()> {
    let name = route.handler.name();
    let signature = route.handler.signature();

    arguments
        .check_signature(full_path, &signature)
        .with_context(|| format!("handler '{name}' cannot be mounted on '{full_path}'"))?;

    for param in &signature.params {
        if arguments.source_of(param.name) == Some(ArgumentSource::AppSingleton)
            && !state.singletons.contains(param.name)
        {
            anyhow::bail!(
                "handler '{name}' needs app singleton '{}' which is not installed",
                param.name
            );
        }
    }

    Ok(())
}

/// Build CORS layer from configuration
fn build_cors_layer(config: &ApiConfig) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(cors.allow_origin(Any));
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{origin}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(cors.allow_origin(origins))
}

/// Swagger UI at `{api_doc_url}/ui` serving the generated document
fn swagger_ui(config: &ApiConfig, openapi: OpenApi) -> SwaggerUi {
    let ui_path = format!("{}/ui", config.api_doc_url.trim_end_matches('/'));
    SwaggerUi::new(ui_path).url(config.openapi_json_path(), openapi)
}
