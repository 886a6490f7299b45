//! Testing utilities for the articles API
//!
//! This crate provides:
//! - Test fixtures for the article types
//! - Builder patterns for inputs and raw multipart request bodies
//!
//! # Examples
//!
//! ```
//! use articles_testing::{builders::*, fixtures::*};
//!
//! let new = create_test_new_article();
//! assert!(!new.header.is_empty());
//!
//! let form = MultipartBodyBuilder::new()
//!     .text("meta", r#"{"article_id": "00000000-0000-0000-0000-000000000000"}"#)
//!     .file("file", "notes.txt", b"hello".to_vec());
//! assert!(form.content_type().starts_with("multipart/form-data"));
//! ```

pub mod builders;
pub mod fixtures;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;

// Re-export testing dependencies for convenience
pub use fake;
pub use proptest;
