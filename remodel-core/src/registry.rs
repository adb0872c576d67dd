//! Injectable registry of entity schemas and index requirements.
//!
//! One [`SchemaRegistry`] is created at startup and shared by everything
//! that defines entities. It owns the naming conventions, the entity table
//! and the [`IndexRegistry`]. Entity creation is an atomic
//! check-then-insert, so concurrent definitions can neither lose an entity
//! nor create one twice.

use crate::config::NamingConfig;
use crate::error::{RemodelError, Result};
use crate::index::IndexRegistry;
use crate::schema::{EntityDefinition, EntitySchema, SchemaBuilder};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Registry of defined entities and the indices their relations need.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    naming: NamingConfig,
    indexes: IndexRegistry,
    entities: RwLock<BTreeMap<String, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry with the conventional naming.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with custom naming conventions.
    ///
    /// # Errors
    /// Returns a configuration error if `naming` fails validation.
    pub fn with_naming(naming: NamingConfig) -> Result<Self> {
        naming.validate()?;
        Ok(Self {
            naming,
            ..Default::default()
        })
    }

    /// Naming conventions applied to bare relation declarations.
    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// Index requirements collected so far.
    pub fn indexes(&self) -> &IndexRegistry {
        &self.indexes
    }

    /// Builds and registers the schema of an entity definition.
    pub fn define(&self, definition: EntityDefinition) -> Result<Arc<EntitySchema>> {
        SchemaBuilder::new(self).build(definition)
    }

    /// Registers a finished schema under its name.
    ///
    /// # Errors
    /// Returns [`RemodelError::DuplicateRegistration`] if the name is taken.
    pub fn create_entity(&self, schema: EntitySchema) -> Result<Arc<EntitySchema>> {
        let mut entities = self.entities.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Entity table lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        });

        match entities.entry(schema.name().to_string()) {
            Entry::Occupied(entry) => Err(RemodelError::duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                let schema = Arc::new(schema);
                entry.insert(Arc::clone(&schema));
                tracing::debug!("Registered entity {}", schema.name());
                Ok(schema)
            }
        }
    }

    /// Looks up a registered schema.
    pub fn entity(&self, name: &str) -> Option<Arc<EntitySchema>> {
        self.read().get(name).cloned()
    }

    /// Whether an entity with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Names of all registered entities, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<EntitySchema>>> {
        self.entities.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Entity table lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_create_entity_rejects_reused_names() {
        let registry = SchemaRegistry::new();
        let naming = registry.naming().clone();
        let keys = ["post_id".to_string(), "tag_id".to_string()];

        registry
            .create_entity(EntitySchema::join("_PostTag", &keys, &naming))
            .expect("first registration");
        let error = registry
            .create_entity(EntitySchema::join("_PostTag", &keys, &naming))
            .expect_err("second registration");

        assert!(error.is_duplicate_registration());
        assert!(registry.contains("_PostTag"));
        assert!(!registry.contains("Post"));
    }

    #[test]
    fn test_with_naming_validates() {
        assert!(SchemaRegistry::with_naming(NamingConfig::new().with_primary_key("")).is_err());

        let registry = SchemaRegistry::with_naming(NamingConfig::new().with_primary_key("pk"))
            .expect("valid naming");
        assert_eq!(registry.naming().primary_key, "pk");
        assert!(registry.indexes().is_empty());
    }

    #[test]
    fn test_concurrent_creation_registers_once() {
        let registry = Arc::new(SchemaRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let naming = registry.naming().clone();
                    let keys = ["post_id".to_string(), "tag_id".to_string()];
                    registry
                        .create_entity(EntitySchema::join("_PostTag", &keys, &naming))
                        .is_ok()
                })
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked"))
            .filter(|created| *created)
            .count();

        assert_eq!(created, 1);
        assert_eq!(registry.entity_names(), vec!["_PostTag"]);
    }
}
