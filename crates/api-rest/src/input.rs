//! Request input extraction.
//!
//! The dispatch middleware is the only place request bodies are consumed.
//! [`RequestContext::extract`] turns an inbound request into the decoded
//! [`InputData`] plus the raw request head, ready for argument binding.

use crate::{
    error::{ExtractionError, HandlerError, HandlerResult},
    state::AppSingletons,
};
use articles_common::serialization::serialize_bytes_len;
use axum::{
    body::{to_bytes, Body},
    extract::{rejection::PathRejection, FromRequest, FromRequestParts, Multipart, Path, Query},
    http::{request::Parts, HeaderMap, Method, Request, Uri, Version},
};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use validator::Validate;

/// Head of the inbound request, handed to parameters declared as raw request
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// HTTP method
    pub method: Method,
    /// Request uri
    pub uri: Uri,
    /// HTTP version
    pub version: Version,
    /// Request headers
    pub headers: HeaderMap,
}

impl RawRequest {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }
}

/// File received as a multipart part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    /// Original file name sent by the client
    pub file_name: String,

    /// Raw file contents, summarized by size when serialized
    #[serde(rename = "file_size", serialize_with = "serialize_bytes_len")]
    pub file_data: Bytes,
}

/// One decoded multipart part
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormPart {
    /// Part without a filename, decoded as JSON
    Json(Value),
    /// Part with a filename
    File(UploadedFile),
}

/// Multipart body: part name to decoded part, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MultipartForm(IndexMap<String, FormPart>);

impl MultipartForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part, replacing an earlier part with the same name
    pub fn insert(&mut self, name: impl Into<String>, part: FormPart) {
        self.0.insert(name.into(), part);
    }

    /// Look up a part by name
    pub fn get(&self, name: &str) -> Option<&FormPart> {
        self.0.get(name)
    }

    /// Part names in arrival order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the form has no parts
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode and validate a JSON part
    pub fn json<T>(&self, name: &str) -> HandlerResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        match self.get(name) {
            Some(FormPart::Json(value)) => {
                let data = T::deserialize(value)
                    .map_err(|err| HandlerError::validation(format!("part '{name}': {err}")))?;
                data.validate()?;
                Ok(data)
            }
            Some(FormPart::File(_)) => Err(HandlerError::validation(format!(
                "part '{name}' must be a JSON value, not a file"
            ))),
            None => Err(HandlerError::validation(format!(
                "multipart part '{name}' is missing"
            ))),
        }
    }

    /// Get a file part
    pub fn file(&self, name: &str) -> HandlerResult<&UploadedFile> {
        match self.get(name) {
            Some(FormPart::File(file)) => Ok(file),
            Some(FormPart::Json(_)) => Err(HandlerError::validation(format!(
                "part '{name}' must be a file"
            ))),
            None => Err(HandlerError::validation(format!(
                "multipart part '{name}' is missing"
            ))),
        }
    }
}

/// Decoded request body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// The request had no body
    #[default]
    Absent,
    /// JSON body
    Json(Value),
    /// Multipart form body
    Multipart(MultipartForm),
}

/// Everything decoded from a request before the handler runs
#[derive(Debug, Clone, Default, Serialize)]
pub struct InputData {
    /// Decoded body
    pub request_body: RequestBody,
    /// Path parameters of the matched route
    pub url_parts: HashMap<String, String>,
    /// Query string parameters
    pub url_query: HashMap<String, String>,
}

/// Values attached to one request by earlier middleware
#[derive(Debug, Clone, Default)]
pub struct RequestScope(HashMap<String, Value>);

impl RequestScope {
    /// Look up a request-scoped value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a request-scoped value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Per-call bundle handed to the argument manager
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw request head
    pub raw: Arc<RawRequest>,
    /// Decoded input
    pub input: InputData,
    /// Request-scoped values
    pub scope: RequestScope,
    /// Application-scoped singletons
    pub singletons: AppSingletons,
}

impl RequestContext {
    /// Decode a request.
    ///
    /// Multipart handlers get their body decoded part by part; any other
    /// non-empty body is decoded as a single JSON document.
    pub async fn extract(
        request: Request<Body>,
        multipart: bool,
        max_body_size: usize,
        singletons: AppSingletons,
    ) -> Result<Self, ExtractionError> {
        let (mut parts, body) = request.into_parts();

        let raw = Arc::new(RawRequest::from_parts(&parts));
        let scope = parts
            .extensions
            .get::<RequestScope>()
            .cloned()
            .unwrap_or_default();

        let url_parts = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
            .await
        {
            Ok(Path(params)) => params,
            Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
            Err(rejection) => return Err(ExtractionError::PathParams(rejection.body_text())),
        };

        let Query(url_query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|rejection| ExtractionError::QueryParams(rejection.body_text()))?;

        let request_body = if multipart {
            let request = Request::from_parts(parts, body);
            RequestBody::Multipart(read_multipart(request).await?)
        } else {
            read_json(body, max_body_size).await?
        };

        Ok(Self {
            raw,
            input: InputData {
                request_body,
                url_parts,
                url_query,
            },
            scope,
            singletons,
        })
    }
}

async fn read_json(body: Body, max_body_size: usize) -> Result<RequestBody, ExtractionError> {
    let bytes = to_bytes(body, max_body_size)
        .await
        .map_err(|err| ExtractionError::BodyRead(err.to_string()))?;

    if bytes.is_empty() {
        return Ok(RequestBody::Absent);
    }

    serde_json::from_slice(&bytes)
        .map(RequestBody::Json)
        .map_err(|err| ExtractionError::JsonDecode(err.to_string()))
}

async fn read_multipart(request: Request<Body>) -> Result<MultipartForm, ExtractionError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| ExtractionError::Multipart(rejection.body_text()))?;

    let mut form = MultipartForm::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ExtractionError::Multipart(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|err| ExtractionError::Multipart(err.body_text()))?;

        let part = match file_name {
            Some(file_name) => FormPart::File(UploadedFile {
                file_name,
                file_data: data,
            }),
            None => {
                let value = serde_json::from_slice(&data).map_err(|err| {
                    ExtractionError::JsonDecode(format!("part '{name}': {err}"))
                })?;
                FormPart::Json(value)
            }
        };

        form.insert(name, part);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use articles_testing::MultipartBodyBuilder;
    use serde_json::json;

    #[test]
    fn test_uploaded_file_logs_size_not_bytes() {
        let mut form = MultipartForm::new();
        form.insert("meta", FormPart::Json(json!({"a": 1})));
        form.insert(
            "file",
            FormPart::File(UploadedFile {
                file_name: "a.txt".to_string(),
                file_data: Bytes::from_static(b"hello"),
            }),
        );

        let value = serde_json::to_value(RequestBody::Multipart(form)).unwrap();
        assert_eq!(
            value,
            json!({
                "meta": {"a": 1},
                "file": {"file_name": "a.txt", "file_size": 5},
            })
        );
    }

    #[test]
    fn test_form_part_accessors() {
        let mut form = MultipartForm::new();
        form.insert("meta", FormPart::Json(json!({"a": 1})));
        form.insert(
            "file",
            FormPart::File(UploadedFile {
                file_name: "a.txt".to_string(),
                file_data: Bytes::from_static(b"hello"),
            }),
        );

        assert_eq!(form.file("file").unwrap().file_name, "a.txt");
        assert_eq!(form.names().collect::<Vec<_>>(), vec!["meta", "file"]);

        let err = form.file("meta").unwrap_err();
        assert_eq!(err.error_type(), "InputDataValidationError");

        let err = form.file("missing").unwrap_err();
        assert_eq!(err.to_string(), "multipart part 'missing' is missing");
    }

    #[test]
    fn test_absent_body_serializes_as_null() {
        let value = serde_json::to_value(InputData::default()).unwrap();
        assert_eq!(value["request_body"], Value::Null);
    }

    #[tokio::test]
    async fn test_extract_json_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/create_article?x=1")
            .body(Body::from(r#"{"header": "H"}"#))
            .unwrap();

        let ctx = RequestContext::extract(request, false, 1024, AppSingletons::default())
            .await
            .unwrap();

        assert_eq!(ctx.input.request_body, RequestBody::Json(json!({"header": "H"})));
        assert_eq!(ctx.input.url_query.get("x").map(String::as_str), Some("1"));
        assert!(ctx.input.url_parts.is_empty());
        assert_eq!(ctx.raw.method, Method::POST);
    }

    #[tokio::test]
    async fn test_extract_empty_body_is_absent() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let ctx = RequestContext::extract(request, false, 1024, AppSingletons::default())
            .await
            .unwrap();

        assert_eq!(ctx.input.request_body, RequestBody::Absent);
    }

    #[tokio::test]
    async fn test_extract_malformed_json() {
        let request = Request::builder()
            .uri("/")
            .body(Body::from("{not json"))
            .unwrap();

        let err = RequestContext::extract(request, false, 1024, AppSingletons::default())
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "JsonDecodeError");
    }

    #[tokio::test]
    async fn test_extract_body_over_limit() {
        let request = Request::builder()
            .uri("/")
            .body(Body::from(vec![b' '; 64]))
            .unwrap();

        let err = RequestContext::extract(request, false, 16, AppSingletons::default())
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "BodyReadError");
    }

    #[tokio::test]
    async fn test_extract_multipart_form() {
        let builder = MultipartBodyBuilder::new()
            .json("meta", &json!({"article_id": 7}))
            .file("file", "a.txt", b"hello".to_vec());
        let content_type = builder.content_type();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload_article_file")
            .header("content-type", content_type)
            .body(Body::from(builder.build()))
            .unwrap();

        let ctx = RequestContext::extract(request, true, 1024, AppSingletons::default())
            .await
            .unwrap();

        let RequestBody::Multipart(form) = &ctx.input.request_body else {
            panic!("expected a multipart body, got {:?}", ctx.input.request_body);
        };
        assert_eq!(form.names().collect::<Vec<_>>(), vec!["meta", "file"]);
        assert_eq!(form.get("meta"), Some(&FormPart::Json(json!({"article_id": 7}))));

        let file = form.file("file").unwrap();
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.file_data, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_extract_multipart_part_with_bad_json() {
        let builder = MultipartBodyBuilder::new().text("meta", "{not json");
        let content_type = builder.content_type();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload_article_file")
            .header("content-type", content_type)
            .body(Body::from(builder.build()))
            .unwrap();

        let err = RequestContext::extract(request, true, 1024, AppSingletons::default())
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "JsonDecodeError");
    }

    #[tokio::test]
    async fn test_extract_multipart_without_boundary() {
        let request = Request::builder()
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = RequestContext::extract(request, true, 1024, AppSingletons::default())
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "MultipartError");
    }
}
