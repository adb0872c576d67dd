//! Record store interface consumed by relation resolution.
//!
//! Query execution belongs to the storage backend. Relation descriptors
//! only need two lookups: records of an entity filtered by key equality,
//! and a record by primary key. [`MemoryStore`] implements both in memory
//! for tests and embedded use.

use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// A stored record: field name to value.
pub type Record = Map<String, Value>;

/// Backend lookups used while resolving relations.
///
/// # Object Safety
/// This trait is object-safe; descriptors take `&dyn RecordStore`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns all records of `entity` whose `key` equals `value`.
    async fn find_by(&self, entity: &str, key: &str, value: &Value) -> Result<Vec<Record>>;

    /// Returns the record of `entity` with the given primary key value.
    async fn get(&self, entity: &str, primary_key: &Value) -> Result<Option<Record>>;
}

/// In-memory record store keyed by entity name.
///
/// Records keep insertion order. Every lookup is counted so callers can
/// observe when a relation actually hit the store.
#[derive(Debug)]
pub struct MemoryStore {
    primary_key: String,
    tables: RwLock<BTreeMap<String, Vec<Record>>>,
    queries: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            tables: RwLock::new(BTreeMap::new()),
            queries: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    /// Creates an empty store using `id` as primary key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the primary key field.
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Appends a record to an entity's table.
    pub fn insert(&self, entity: &str, record: Record) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entity.to_string())
            .or_default()
            .push(record);
    }

    /// Number of records stored for an entity.
    pub fn count(&self, entity: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .map_or(0, Vec::len)
    }

    /// Number of lookups served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn matching(&self, entity: &str, key: &str, value: &Value) -> Vec<Record> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| record.get(key) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by(&self, entity: &str, key: &str, value: &Value) -> Result<Vec<Record>> {
        Ok(self.matching(entity, key, value))
    }

    async fn get(&self, entity: &str, primary_key: &Value) -> Result<Option<Record>> {
        Ok(self
            .matching(entity, &self.primary_key, primary_key)
            .into_iter()
            .next())
    }
}
