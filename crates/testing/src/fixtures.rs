//! Test fixtures for generating domain entities with realistic data.
//!
//! This module provides functions to create test instances of the article
//! types with sensible defaults and randomized text.

use articles_domain::{Article, ArticleFileMeta, ArticleId, NewArticle};
use chrono::{NaiveDate, Utc};
use fake::{
    faker::lorem::en::{Paragraph, Sentence},
    Fake,
};
use serde_json::{json, Value};

/// Fixed date used where tests need a stable `created` value
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 4, 26).unwrap_or_default()
}

/// Create a new-article input with random header and content
pub fn create_test_new_article() -> NewArticle {
    NewArticle {
        header: Sentence(2..6).fake(),
        content: Paragraph(1..3).fake(),
        created: None,
    }
}

/// Create a stored article created today
pub fn create_test_article() -> Article {
    create_test_article_on(Utc::now().date_naive())
}

/// Create a stored article created on the given date
pub fn create_test_article_on(created: NaiveDate) -> Article {
    let new = create_test_new_article();
    Article {
        id: ArticleId::new(),
        created,
        header: new.header,
        content: new.content,
    }
}

/// Upload metadata pointing at an article
pub fn create_test_file_meta(article_id: ArticleId) -> ArticleFileMeta {
    ArticleFileMeta { article_id }
}

/// JSON payload accepted by the create-article endpoint
pub fn new_article_json(header: &str, content: &str) -> Value {
    json!({
        "header": header,
        "content": content,
    })
}
