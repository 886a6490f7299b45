//! Keyword-argument dispatch for API handlers.
//!
//! [`KwargsHandler`] wraps every call to a registered API handler: it
//! extracts the request input, resolves the handler's declared parameters,
//! invokes it and turns the outcome into a JSON response. Plain routes are
//! mounted without it and never reach this code.

use crate::{
    arguments::ArgumentsManager,
    error::{ApiError, HandlerError},
    handler::ApiHandler,
    input::RequestContext,
    state::{AppSingletons, AppState},
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
};
use serde_json::Value;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, warn};

const APPLICATION_JSON: &str = "application/json";

/// Dispatch middleware state, immutable once the app is built
#[derive(Debug)]
pub struct KwargsHandler {
    arguments: Arc<ArgumentsManager>,
    json_api_handlers: HashSet<&'static str>,
    multipart_handlers: HashSet<&'static str>,
    max_body_size: usize,
}

impl KwargsHandler {
    /// Create a dispatcher resolving parameters through `arguments`
    pub fn new(arguments: ArgumentsManager, max_body_size: usize) -> Self {
        Self {
            arguments: Arc::new(arguments),
            json_api_handlers: HashSet::new(),
            multipart_handlers: HashSet::new(),
            max_body_size,
        }
    }

    /// The argument registry
    pub fn arguments(&self) -> &ArgumentsManager {
        &self.arguments
    }

    /// Register a handler taking a JSON body (or none)
    pub fn register_json_api(&mut self, name: &'static str) {
        self.json_api_handlers.insert(name);
    }

    /// Register a handler taking a multipart body
    pub fn register_multipart(&mut self, name: &'static str) {
        self.json_api_handlers.insert(name);
        self.multipart_handlers.insert(name);
    }

    /// Check whether a handler is wrapped by this dispatcher
    pub fn is_api_handler(&self, name: &str) -> bool {
        self.json_api_handlers.contains(name)
    }

    /// Check whether a handler expects a multipart body
    pub fn is_multipart(&self, name: &str) -> bool {
        self.multipart_handlers.contains(name)
    }

    /// Handle one request for `handler`.
    ///
    /// Always answers with `application/json`: 200 with the handler result,
    /// 400 for extraction and validation failures, 500 for everything else.
    pub async fn dispatch(
        &self,
        handler: &dyn ApiHandler,
        singletons: AppSingletons,
        request: Request<Body>,
    ) -> Response {
        let name = handler.name();
        let uri = request.uri().clone();

        if !self.is_api_handler(name) {
            let err = ApiError::from(HandlerError::InvalidArgument(format!(
                "handler '{name}' is not registered as an API handler"
            )));
            return self.failure(name, &uri, err, Value::Null);
        }

        let ctx = match RequestContext::extract(
            request,
            self.is_multipart(name),
            self.max_body_size,
            singletons,
        )
        .await
        {
            Ok(ctx) => ctx,
            Err(err) => return self.failure(name, &uri, err.into(), Value::Null),
        };

        match self.invoke(handler, &ctx).await {
            Ok(json) => {
                debug!(handler = name, url = %uri, "API handler call succeeded");
                json_response(StatusCode::OK, json)
            }
            Err(err) => {
                let input_data = serde_json::to_value(&ctx.input).unwrap_or(Value::Null);
                self.failure(name, &uri, err, input_data)
            }
        }
    }

    async fn invoke(&self, handler: &dyn ApiHandler, ctx: &RequestContext) -> Result<String, ApiError> {
        let signature = handler.signature();
        let kwargs = self
            .arguments
            .build_kwargs(handler.name(), &signature, ctx)
            .map_err(HandlerError::from)?;

        let reply = handler.call(kwargs).await?;

        Ok(reply.to_json()?)
    }

    fn failure(&self, handler: &str, uri: &Uri, err: ApiError, input_data: Value) -> Response {
        let status = err.status_code();
        let body = err.body();
        let error = serde_json::to_string(&body).unwrap_or_else(|_| body.to_string());

        warn!(
            handler,
            url = %uri,
            error = %error,
            status = status.as_u16(),
            input_data = %input_data,
            "API handler call failed"
        );

        json_response(status, error)
    }
}

fn json_response(status: StatusCode, json: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
        json,
    )
        .into_response()
}

/// Build the method router that feeds `handler` through the dispatcher
pub fn api_endpoint(
    method: &Method,
    kwargs: Arc<KwargsHandler>,
    handler: Arc<dyn ApiHandler>,
) -> anyhow::Result<MethodRouter<AppState>> {
    let filter = MethodFilter::try_from(method.clone())
        .map_err(|err| anyhow::anyhow!("unsupported method {method} for '{}': {err}", handler.name()))?;

    let endpoint = move |State(state): State<AppState>, request: Request| {
        let kwargs = Arc::clone(&kwargs);
        let handler = Arc::clone(&handler);
        async move {
            kwargs
                .dispatch(handler.as_ref(), state.singletons.clone(), request)
                .await
        }
    };

    Ok(on(filter, endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::HandlerResult,
        handler::{ParamType, Reply, Signature},
    };
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use serde::ser::Error as _;
    use serde::Serialize;

    struct Echo;

    #[async_trait]
    impl ApiHandler for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn signature(&self) -> Signature {
            Signature::new().param("body", ParamType::Opaque)
        }

        async fn call(&self, kwargs: crate::arguments::Kwargs) -> HandlerResult<Reply> {
            match kwargs.get("body")? {
                crate::arguments::ArgValue::Body(body) => Ok(Reply::json(
                    serde_json::to_value(body).map_err(HandlerError::internal)?,
                )),
                _ => Err(HandlerError::internal("unexpected argument")),
            }
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("value is not encodable"))
        }
    }

    struct Broken;

    #[async_trait]
    impl ApiHandler for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn signature(&self) -> Signature {
            Signature::new()
        }

        async fn call(&self, _: crate::arguments::Kwargs) -> HandlerResult<Reply> {
            Ok(Reply::json(Unencodable))
        }
    }

    fn dispatcher() -> KwargsHandler {
        let mut arguments = ArgumentsManager::new();
        arguments.reg_request_body("body").unwrap();

        let mut kwargs = KwargsHandler::new(arguments, 1024);
        kwargs.register_json_api("echo");
        kwargs.register_json_api("broken");
        kwargs
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_is_json_200() {
        let response = dispatcher()
            .dispatch(&Echo, AppSingletons::default(), post(r#"{"a": [1, 2]}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            APPLICATION_JSON
        );
        assert_eq!(body_json(response).await, serde_json::json!({"a": [1, 2]}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let response = dispatcher()
            .dispatch(&Echo, AppSingletons::default(), post("{oops"))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error_type"], "JsonDecodeError");
        assert!(body["error_message"].as_str().unwrap().contains("key must be a string"));
    }

    #[tokio::test]
    async fn test_encoding_failure_is_500() {
        let response = dispatcher()
            .dispatch(&Broken, AppSingletons::default(), post(""))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            APPLICATION_JSON
        );
        let body = body_json(response).await;
        assert_eq!(body["error_type"], "JsonEncodeError");
        assert_eq!(body["error_message"], "value is not encodable");
    }

    #[tokio::test]
    async fn test_unregistered_handler_is_500() {
        let kwargs = KwargsHandler::new(ArgumentsManager::new(), 1024);

        let response = kwargs
            .dispatch(&Echo, AppSingletons::default(), post("{}"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error_type"], "InvalidHandlerArgument");
    }

    #[tokio::test]
    async fn test_unbound_parameter_is_500() {
        let mut kwargs = KwargsHandler::new(ArgumentsManager::new(), 1024);
        kwargs.register_json_api("echo");

        let response = kwargs
            .dispatch(&Echo, AppSingletons::default(), post("{}"))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error_type"], "InvalidHandlerArgument");
        assert_eq!(
            body["error_message"],
            "no argument source registered for parameter 'body'"
        );
    }

    #[test]
    fn test_multipart_handlers_are_api_handlers() {
        let mut kwargs = KwargsHandler::new(ArgumentsManager::new(), 1024);
        kwargs.register_multipart("upload");

        assert!(kwargs.is_api_handler("upload"));
        assert!(kwargs.is_multipart("upload"));
        assert!(!kwargs.is_api_handler("health_check"));
    }
}
