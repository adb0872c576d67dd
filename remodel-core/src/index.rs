//! Registry of `(entity, key)` pairs that need a secondary index.
//!
//! Relation lookups filter the related entity by a key; every declaration
//! records the key the opposite side looks up by. The storage backend reads
//! [`IndexRegistry::entries`] when provisioning tables and creates the
//! indices. Registration is a set union, so declaring the same relation
//! from several places never produces duplicate entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A single `(entity, key)` pair requiring a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Entity whose records are filtered
    pub entity: String,
    /// Key the lookup filters on
    pub key: String,
}

impl IndexEntry {
    /// Creates a new index entry.
    pub fn new(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.key)
    }
}

/// Append-only, thread-safe set of index entries.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    entries: RwLock<BTreeSet<IndexEntry>>,
}

impl IndexRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an `(entity, key)` pair.
    ///
    /// Returns `true` if the pair was not present before. Registering an
    /// existing pair is a no-op.
    pub fn register(&self, entity: &str, key: &str) -> bool {
        self.insert(IndexEntry::new(entity, key))
    }

    /// Registers a prepared entry. See [`IndexRegistry::register`].
    pub fn insert(&self, entry: IndexEntry) -> bool {
        let mut entries = self.write();
        let label = entry.to_string();
        let inserted = entries.insert(entry);
        if inserted {
            tracing::trace!("Registered index {}", label);
        }
        inserted
    }

    /// Returns a sorted snapshot of all registered entries.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.read().iter().cloned().collect()
    }

    /// Returns the keys registered for one entity, sorted.
    pub fn entries_for(&self, entity: &str) -> Vec<String> {
        self.read()
            .iter()
            .filter(|entry| entry.entity == entity)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Whether the pair is registered.
    pub fn contains(&self, entity: &str, key: &str) -> bool {
        self.read().contains(&IndexEntry::new(entity, key))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no entry has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned set is still a valid set: every write is a single insert.
    fn read(&self) -> RwLockReadGuard<'_, BTreeSet<IndexEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Index registry lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<IndexEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Index registry lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}
