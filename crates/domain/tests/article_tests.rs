//! Tests for article input validation and query matching

use articles_domain::{Article, ArticleId, NewArticle, ReadArticlesQuery};
use chrono::NaiveDate;
use proptest::prelude::*;
use validator::Validate;

fn article(header: String) -> Article {
    Article {
        id: ArticleId::new(),
        created: NaiveDate::from_ymd_opt(2022, 4, 26).unwrap(),
        header,
        content: "Content".to_string(),
    }
}

// ============================================================================
// NewArticle Tests
// ============================================================================

#[test]
fn test_new_article_header_too_long() {
    let new = NewArticle {
        header: "x".repeat(201),
        content: "C".to_string(),
        created: None,
    };

    let errors = new.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("header"));
}

#[test]
fn test_new_article_accepts_iso_date() {
    let new: NewArticle = serde_json::from_str(
        r#"{"header": "H", "content": "C", "created": "2022-04-26"}"#,
    )
    .unwrap();

    assert_eq!(new.created, NaiveDate::from_ymd_opt(2022, 4, 26));
}

#[test]
fn test_new_article_rejects_bad_date() {
    let result = serde_json::from_str::<NewArticle>(
        r#"{"header": "H", "content": "C", "created": "26.04.2022"}"#,
    );

    assert!(result.is_err());
}

// ============================================================================
// ReadArticlesQuery Tests
// ============================================================================

#[test]
fn test_query_rejects_unknown_parameter() {
    let result = serde_json::from_str::<ReadArticlesQuery>(r#"{"header": "H"}"#);
    assert!(result.is_err());
}

#[test]
fn test_query_empty_prefix_is_invalid() {
    let query = ReadArticlesQuery {
        header_prefix: Some(String::new()),
    };

    assert!(query.validate().is_err());
}

proptest! {
    #[test]
    fn prop_header_length_bounds(header in "[a-zA-Z ]{1,200}") {
        let new = NewArticle {
            header,
            content: "C".to_string(),
            created: None,
        };

        prop_assert!(new.validate().is_ok());
    }

    #[test]
    fn prop_prefix_of_header_matches(header in "[a-z]{1,40}", cut in 1usize..40) {
        let cut = cut.min(header.len());
        let query = ReadArticlesQuery {
            header_prefix: Some(header[..cut].to_string()),
        };

        prop_assert!(query.matches(&article(header)));
    }
}
