//! Articles Domain Types
//!
//! This crate provides the domain model of the articles API: typed
//! identifiers, the article entities, and the validated input types accepted
//! by the API handlers.
//!
//! ## Usage
//!
//! ```rust
//! use articles_domain::{NewArticle, ArticleId};
//! use validator::Validate;
//!
//! let new = NewArticle {
//!     header: "Header".to_string(),
//!     content: "Content".to_string(),
//!     created: None,
//! };
//! assert!(new.validate().is_ok());
//!
//! let id = ArticleId::new();
//! assert_eq!(id.to_string().len(), 36);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod identifiers;

// Re-export commonly used types
pub use article::{
    Article, ArticleFile, ArticleFileMeta, ArticleFileUpload, NewArticle, ReadArticlesQuery,
};
pub use identifiers::*;

/// Table holding articles
pub const ARTICLES_TABLE: &str = "articles";

/// Table holding metadata of files attached to articles
pub const ARTICLE_FILES_TABLE: &str = "article_files";
