//! Application state and dependency injection.
//!
//! This module defines the shared application state that is passed
//! to all route handlers via Axum's state extraction, and the set of
//! application-scoped singletons handlers can request by name.

use crate::config::ApiConfig;
use articles_domain::{ARTICLES_TABLE, ARTICLE_FILES_TABLE};
use articles_infrastructure::{SimpleStorage, Storage};
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Name the storage singleton is registered under
pub const STORAGE_KEY: &str = "storage";

type Singleton = Arc<dyn Any + Send + Sync>;

/// Immutable name-to-value map of application-scoped singletons
#[derive(Clone, Default)]
pub struct AppSingletons(Arc<HashMap<String, Singleton>>);

impl AppSingletons {
    /// Start collecting singletons
    pub fn builder() -> AppSingletonsBuilder {
        AppSingletonsBuilder::default()
    }

    /// Look up a singleton by name
    pub fn get(&self, name: &str) -> Option<&Singleton> {
        self.0.get(name)
    }

    /// Check whether a singleton is installed
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl fmt::Debug for AppSingletons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Builder for [`AppSingletons`]
#[derive(Default)]
pub struct AppSingletonsBuilder {
    values: HashMap<String, Singleton>,
}

impl AppSingletonsBuilder {
    /// Install a singleton; handlers read it back with the same type
    pub fn insert<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.values.insert(name.into(), Arc::new(value));
        self
    }

    /// Freeze the collected singletons
    pub fn build(self) -> AppSingletons {
        AppSingletons(Arc::new(self.values))
    }
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// API configuration
    pub config: Arc<ApiConfig>,

    /// Application-scoped singletons
    pub singletons: AppSingletons,
}

impl AppState {
    /// Create a new application state backed by an in-memory storage
    /// with the article tables already present
    pub fn new(config: ApiConfig) -> Self {
        let storage = SimpleStorage::with_tables([ARTICLES_TABLE, ARTICLE_FILES_TABLE]);
        Self::with_storage(config, Arc::new(storage))
    }

    /// Create application state with a custom storage implementation
    pub fn with_storage(config: ApiConfig, storage: Arc<dyn Storage>) -> Self {
        let singletons = AppSingletons::builder()
            .insert(STORAGE_KEY, storage)
            .build();

        Self::with_singletons(config, singletons)
    }

    /// Create application state with an explicit singleton set
    pub fn with_singletons(config: ApiConfig, singletons: AppSingletons) -> Self {
        Self {
            config: Arc::new(config),
            singletons,
        }
    }

    /// Get the storage singleton, if installed
    pub fn storage(&self) -> Option<Arc<dyn Storage>> {
        self.singletons
            .get(STORAGE_KEY)
            .and_then(|value| value.downcast_ref::<Arc<dyn Storage>>())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_state_has_article_tables() {
        let state = AppState::new(ApiConfig::default());
        let storage = state.storage().unwrap();

        assert!(storage.read(ARTICLES_TABLE, None).await.unwrap().is_empty());
        assert!(storage
            .read(ARTICLE_FILES_TABLE, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_singletons_lookup() {
        let singletons = AppSingletons::builder().insert("answer", 42u32).build();

        assert!(singletons.contains("answer"));
        assert!(!singletons.contains("question"));
        assert_eq!(
            singletons
                .get("answer")
                .and_then(|value| value.downcast_ref::<u32>()),
            Some(&42)
        );
    }
}
