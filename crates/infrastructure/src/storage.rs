//! Storage module - schema-less table storage
//!
//! Records are JSON objects kept in named, insertion-ordered tables. The
//! [`Storage`] trait is what handlers talk to; [`SimpleStorage`] is the
//! process-lifetime in-memory implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{Result, StorageError};

/// Name of the generated identifier field
pub const ID_FIELD_NAME: &str = "id";

/// One stored row: field name to value
pub type Record = Map<String, Value>;

/// Field-equality predicates for [`Storage::read`]
pub type Filters = Map<String, Value>;

/// Storage provider trait for table operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Append a record to a table, creating the table on first use.
    ///
    /// A generated identifier is stored under [`ID_FIELD_NAME`] unless the
    /// record already has one. Returns the stored record.
    async fn create(&self, table_name: &str, record: Record) -> Result<Record>;

    /// Read records from a table in insertion order.
    ///
    /// With filters, only records whose fields equal every filter value are
    /// returned; records lacking a filtered field never match. Reading a
    /// table that was never created fails with
    /// [`StorageError::TableDoesNotExist`].
    async fn read(&self, table_name: &str, filters: Option<&Filters>) -> Result<Vec<Record>>;
}

/// In-memory storage keeping every table for the lifetime of the process.
#[derive(Debug, Default)]
pub struct SimpleStorage {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl SimpleStorage {
    /// Create an empty storage without any tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage with the given (empty) tables already present.
    pub fn with_tables<I, S>(table_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = table_names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Names of all existing tables.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

fn matches(record: &Record, filters: &Filters) -> bool {
    filters
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

#[async_trait]
impl Storage for SimpleStorage {
    #[instrument(skip(self, record))]
    async fn create(&self, table_name: &str, mut record: Record) -> Result<Record> {
        if !record.contains_key(ID_FIELD_NAME) {
            record.insert(
                ID_FIELD_NAME.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }

        // table creation and append happen under one write lock
        self.tables
            .write()
            .entry(table_name.to_string())
            .or_default()
            .push(record.clone());

        debug!(table = table_name, id = ?record.get(ID_FIELD_NAME), "Record created");

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn read(&self, table_name: &str, filters: Option<&Filters>) -> Result<Vec<Record>> {
        let tables = self.tables.read();

        let rows = tables
            .get(table_name)
            .ok_or_else(|| StorageError::TableDoesNotExist(table_name.to_string()))?;

        let result = match filters {
            Some(filters) if !filters.is_empty() => rows
                .iter()
                .filter(|record| matches(record, filters))
                .cloned()
                .collect(),
            _ => rows.clone(),
        };

        Ok(result)
    }
}
