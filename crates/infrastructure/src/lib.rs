//! Infrastructure layer for the articles API
//!
//! This crate provides the record storage used by the request handlers:
//! - The [`Storage`] trait, the seam a persistent backend plugs into
//! - [`SimpleStorage`], an in-memory, process-lifetime implementation
//!
//! ## Usage
//!
//! ```rust
//! use articles_infrastructure::{SimpleStorage, Storage};
//! use serde_json::{json, Map};
//!
//! # tokio_test_block(async {
//! let storage = SimpleStorage::new();
//!
//! let mut record = Map::new();
//! record.insert("header".into(), json!("Header"));
//!
//! let created = storage.create("articles", record).await.unwrap();
//! assert!(created.contains_key("id"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod storage;

pub use storage::{Filters, Record, SimpleStorage, Storage, ID_FIELD_NAME};

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A read addressed a table that was never created
    #[error("Table '{0}' does not exist")]
    TableDoesNotExist(String),
}

impl StorageError {
    /// Error type name reported to API clients
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::TableDoesNotExist(_) => "StorageTableDoesNotExistError",
        }
    }
}
