//! Article entities and the inputs accepted for them.
//!
//! Input types reject unknown fields, so a typo in a client payload is
//! reported instead of being silently dropped.

use crate::identifiers::{ArticleFileId, ArticleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Data for creating a new article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewArticle {
    /// Header
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Header")]
    pub header: String,

    /// Content
    #[validate(length(min = 1))]
    #[schema(example = "Content")]
    pub content: String,

    /// Creation date, today (UTC) when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
}

impl NewArticle {
    /// Fill in the creation date if the client did not supply one
    pub fn with_default_created(mut self, today: NaiveDate) -> Self {
        if self.created.is_none() {
            self.created = Some(today);
        }
        self
    }
}

/// A stored article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Article {
    /// Identifier
    #[schema(value_type = String, format = Uuid)]
    pub id: ArticleId,

    /// Creation date
    pub created: NaiveDate,

    /// Header
    pub header: String,

    /// Content
    pub content: String,
}

/// Query data for reading articles
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct ReadArticlesQuery {
    /// Header prefix used to filter articles
    #[validate(length(min = 1, max = 200))]
    pub header_prefix: Option<String>,
}

impl ReadArticlesQuery {
    /// Check whether an article passes this query
    pub fn matches(&self, article: &Article) -> bool {
        match &self.header_prefix {
            Some(prefix) => article.header.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Metadata part of a file upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ArticleFileMeta {
    /// Article the file belongs to
    #[schema(value_type = String, format = Uuid)]
    pub article_id: ArticleId,
}

/// Multipart form for uploading a file attached to an article
///
/// Only used to describe the request body; the parts are decoded one by one.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ArticleFileUpload {
    /// JSON part with the upload metadata
    #[schema(inline)]
    meta: ArticleFileMeta,

    /// File part
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// A file attached to an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArticleFile {
    /// Identifier
    #[schema(value_type = String, format = Uuid)]
    pub id: ArticleFileId,

    /// Article the file belongs to
    #[schema(value_type = String, format = Uuid)]
    pub article_id: ArticleId,

    /// Original file name
    pub file_name: String,

    /// File size in bytes
    pub file_size: u64,

    /// Upload time
    pub uploaded: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(header: &str) -> Article {
        Article {
            id: ArticleId::new(),
            created: NaiveDate::from_ymd_opt(2022, 4, 26).unwrap(),
            header: header.to_string(),
            content: "Content".to_string(),
        }
    }

    #[test]
    fn test_new_article_rejects_unknown_fields() {
        let result = serde_json::from_value::<NewArticle>(json!({
            "header": "H",
            "content": "C",
            "author": "someone",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_article_rejects_non_string_header() {
        let result = serde_json::from_value::<NewArticle>(json!({
            "header": 1,
            "content": "C",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_article_validation() {
        let empty_header = NewArticle {
            header: String::new(),
            content: "C".to_string(),
            created: None,
        };
        assert!(empty_header.validate().is_err());

        let valid = NewArticle {
            header: "H".to_string(),
            content: "C".to_string(),
            created: None,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_default_created_keeps_supplied_date() {
        let supplied = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2022, 4, 26).unwrap();

        let new = NewArticle {
            header: "H".to_string(),
            content: "C".to_string(),
            created: Some(supplied),
        };
        assert_eq!(new.with_default_created(today).created, Some(supplied));

        let new = NewArticle {
            header: "H".to_string(),
            content: "C".to_string(),
            created: None,
        };
        assert_eq!(new.with_default_created(today).created, Some(today));
    }

    #[test]
    fn test_article_serializes_date_and_id_as_strings() {
        let article = article("H");
        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["created"], "2022-04-26");
        assert_eq!(value["id"], article.id.to_string());
    }

    #[test]
    fn test_query_header_prefix() {
        let query = ReadArticlesQuery {
            header_prefix: Some("Rust".to_string()),
        };
        assert!(query.matches(&article("Rust in production")));
        assert!(!query.matches(&article("Python in production")));
        assert!(ReadArticlesQuery::default().matches(&article("anything")));
    }
}
