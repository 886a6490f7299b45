//! Fluent builder pattern for constructing test data.
//!
//! This module provides builders for article inputs and for raw
//! `multipart/form-data` request bodies.

use articles_domain::NewArticle;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::Serialize;

/// Builder for creating NewArticle test instances
#[derive(Clone)]
pub struct NewArticleBuilder {
    header: String,
    content: String,
    created: Option<NaiveDate>,
}

impl NewArticleBuilder {
    pub fn new() -> Self {
        Self {
            header: "Header".to_string(),
            content: "Content".to_string(),
            created: None,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn created_on(mut self, created: NaiveDate) -> Self {
        self.created = Some(created);
        self
    }

    pub fn build(self) -> NewArticle {
        NewArticle {
            header: self.header,
            content: self.content,
            created: self.created,
        }
    }
}

impl Default for NewArticleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default boundary used by [`MultipartBodyBuilder`]
pub const TEST_BOUNDARY: &str = "----ArticlesTestBoundary7MA4YWxkTrZu0gW";

enum PartData {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        data: Vec<u8>,
    },
}

/// Builder for raw multipart/form-data request bodies
pub struct MultipartBodyBuilder {
    boundary: String,
    parts: Vec<(String, PartData)>,
}

impl MultipartBodyBuilder {
    pub fn new() -> Self {
        Self {
            boundary: TEST_BOUNDARY.to_string(),
            parts: Vec::new(),
        }
    }

    /// Add a part without a filename carrying raw text
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), PartData::Text(value.into())));
        self
    }

    /// Add a part without a filename carrying a JSON document
    pub fn json<T: Serialize>(self, name: impl Into<String>, value: &T) -> Self {
        let text = serde_json::to_string(value).unwrap_or_default();
        self.text(name, text)
    }

    /// Add a file part
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push((
            name.into(),
            PartData::File {
                file_name: file_name.into(),
                content_type: "application/octet-stream".to_string(),
                data: data.into(),
            },
        ));
        self
    }

    /// Value for the request `content-type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn build(self) -> Bytes {
        let mut body = Vec::new();

        for (name, data) in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match data {
                PartData::Text(text) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(text.as_bytes());
                }
                PartData::File {
                    file_name,
                    content_type,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Bytes::from(body)
    }
}

impl Default for MultipartBodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_layout() {
        let builder = MultipartBodyBuilder::new()
            .text("meta", "{}")
            .file("file", "a.txt", b"hello".to_vec());
        let content_type = builder.content_type();
        let body = String::from_utf8(builder.build().to_vec()).unwrap();

        assert!(content_type.ends_with(TEST_BOUNDARY));
        assert!(body.contains("name=\"meta\"\r\n\r\n{}\r\n"));
        assert!(body.contains("name=\"file\"; filename=\"a.txt\""));
        assert!(body.ends_with(&format!("--{TEST_BOUNDARY}--\r\n")));
    }

    #[test]
    fn test_new_article_builder() {
        let article = NewArticleBuilder::new().with_header("H").build();
        assert_eq!(article.header, "H");
        assert_eq!(article.content, "Content");
        assert!(article.created.is_none());
    }
}
