//! Per-instance field storage with restricted-key enforcement.
//!
//! Every direct `get`, `set` and `delete` first consults the entity's
//! restricted-key set; a restricted name fails with
//! [`RemodelError::RestrictedField`] no matter who calls. Relation field
//! names are not plain values either: they are reached through
//! [`FieldAccessGuard::related`] and [`FieldAccessGuard::relate`]. Relation
//! descriptors maintain restricted keys through the crate-internal path.

use crate::error::{FieldOperation, RemodelError, Result};
use crate::relations::Related;
use crate::schema::EntitySchema;
use crate::store::{Record, RecordStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Field values of one entity instance behind the access checks.
///
/// # Example
/// ```rust
/// use remodel_core::{EntityDefinition, FieldAccessGuard, RemodelError, SchemaRegistry};
/// use serde_json::json;
///
/// let registry = SchemaRegistry::new();
/// let post = registry
///     .define(EntityDefinition::new("Post").belongs_to("User"))
///     .expect("valid definition");
///
/// let mut fields = FieldAccessGuard::new(post);
/// fields.set("title", json!("Hello")).expect("plain field");
/// assert!(matches!(
///     fields.set("user_id", json!(1)),
///     Err(RemodelError::RestrictedField { .. })
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct FieldAccessGuard {
    schema: Arc<EntitySchema>,
    values: BTreeMap<String, Value>,
}

impl FieldAccessGuard {
    /// Creates an instance seeded with the declared field defaults.
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        let values = schema.defaults().clone();
        Self { schema, values }
    }

    /// Wraps a record loaded from storage, restricted keys included.
    pub fn from_record(schema: Arc<EntitySchema>, record: Record) -> Self {
        Self {
            schema,
            values: record.into_iter().collect(),
        }
    }

    /// Schema of the wrapped instance.
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Reads a field value.
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        self.check(name, FieldOperation::Get)?;
        Ok(self.values.get(name))
    }

    /// Writes a field value without validation.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        self.check(name, FieldOperation::Set)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Removes a field value, returning the previous one.
    pub fn delete(&mut self, name: &str) -> Result<Option<Value>> {
        self.check(name, FieldOperation::Delete)?;
        Ok(self.values.remove(name))
    }

    /// Validates `value` with the field's descriptor and stores its storage
    /// representation. A rejected value leaves the current one in place.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        self.check(name, FieldOperation::Set)?;
        let stored = match self.schema.field(name) {
            Some(descriptor) => {
                descriptor.validate(&value)?;
                descriptor.to_storage(value)
            }
            None => value,
        };
        self.values.insert(name.to_string(), stored);
        Ok(())
    }

    /// Reads a field value converted to its native representation.
    pub fn read(&self, name: &str) -> Result<Option<Value>> {
        let Some(stored) = self.get(name)? else {
            return Ok(None);
        };
        Ok(Some(match self.schema.field(name) {
            Some(descriptor) => descriptor.to_native(stored.clone()),
            None => stored.clone(),
        }))
    }

    /// Resolves the relation field `name` through its descriptor.
    pub async fn related(&self, name: &str, store: &dyn RecordStore) -> Result<Related> {
        let descriptor = self.schema.relation(name).ok_or_else(|| {
            RemodelError::configuration(
                self.schema.name(),
                format!("'{}' is not a relation field", name),
            )
        })?;
        descriptor.resolve(self, store).await
    }

    /// Points the belongs_to relation `name` at `related` (or clears it).
    pub fn relate(&mut self, name: &str, related: Option<&Record>) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let descriptor = schema.relation(name).ok_or_else(|| {
            RemodelError::configuration(
                schema.name(),
                format!("'{}' is not a relation field", name),
            )
        })?;
        descriptor.assign(self, related)
    }

    /// All caller-visible fields: internal, restricted and relation names
    /// are omitted.
    pub fn as_mapping(&self) -> Record {
        let naming_prefix = self.schema.internal_prefix();
        self.values
            .iter()
            .filter(|(name, _)| !name.starts_with(naming_prefix))
            .filter(|(name, _)| !self.schema.is_restricted(name))
            .filter(|(name, _)| !self.schema.is_related(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub(crate) fn get_internal(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub(crate) fn set_internal(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn delete_internal(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    fn check(&self, name: &str, operation: FieldOperation) -> Result<()> {
        if self.schema.is_restricted(name) {
            return Err(RemodelError::restricted(name, operation));
        }
        if self.schema.is_related(name) {
            return Err(RemodelError::configuration(
                self.schema.name(),
                format!(
                    "cannot {} relation field '{}' directly; use related() or relate()",
                    operation, name
                ),
            ));
        }
        Ok(())
    }
}
