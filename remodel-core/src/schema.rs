//! Entity definitions and their assembly into immutable schemas.
//!
//! An [`EntityDefinition`] lists plain fields and relation declarations.
//! [`SchemaBuilder`] turns it into an [`EntitySchema`]: every declaration
//! is parsed and wired into a descriptor, `belongs_to` local keys become
//! restricted, many-to-many join entities are synthesized and the lookup
//! keys are registered for indexing.
//!
//! A failed definition leaves the registry untouched: parsing and wiring
//! are checked before the entity is created, and index entries and join
//! entities are only committed once the entity itself was registered.

use crate::config::NamingConfig;
use crate::error::{RemodelError, Result};
use crate::fields::{Field, FieldDescriptor, FieldSpec};
use crate::registry::SchemaRegistry;
use crate::relations::{
    RelationDeclaration, RelationDescriptor, RelationKind, WiredRelation, build_descriptor,
    parse_declaration,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Declarative description of one entity.
///
/// # Example
/// ```rust
/// use remodel_core::{EntityDefinition, FieldSpec, RelationDeclaration};
///
/// let post = EntityDefinition::new("Post")
///     .belongs_to("User")
///     .has_many(RelationDeclaration::explicit("Comment", "replies", "id", "post_id"))
///     .has_and_belongs_to_many("Tag")
///     .field(FieldSpec::string("title"));
///
/// assert_eq!(post.declarations(remodel_core::RelationKind::BelongsTo).len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Entity name
    pub name: String,
    /// has_one declarations
    #[serde(default)]
    pub has_one: Vec<RelationDeclaration>,
    /// belongs_to declarations
    #[serde(default)]
    pub belongs_to: Vec<RelationDeclaration>,
    /// has_many declarations
    #[serde(default)]
    pub has_many: Vec<RelationDeclaration>,
    /// has_and_belongs_to_many declarations
    #[serde(default)]
    pub has_and_belongs_to_many: Vec<RelationDeclaration>,
    /// Plain fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl EntityDefinition {
    /// Starts a definition with no fields or relations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parses a definition from JSON.
    ///
    /// Relation declarations of any shape are accepted here; malformed ones
    /// are reported when the definition is built.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RemodelError::Serialization {
            context: "Failed to parse entity definition".to_string(),
            source: e,
        })
    }

    /// Builder method adding a has_one declaration.
    pub fn has_one(mut self, declaration: impl Into<RelationDeclaration>) -> Self {
        self.has_one.push(declaration.into());
        self
    }

    /// Builder method adding a belongs_to declaration.
    pub fn belongs_to(mut self, declaration: impl Into<RelationDeclaration>) -> Self {
        self.belongs_to.push(declaration.into());
        self
    }

    /// Builder method adding a has_many declaration.
    pub fn has_many(mut self, declaration: impl Into<RelationDeclaration>) -> Self {
        self.has_many.push(declaration.into());
        self
    }

    /// Builder method adding a has_and_belongs_to_many declaration.
    pub fn has_and_belongs_to_many(mut self, declaration: impl Into<RelationDeclaration>) -> Self {
        self.has_and_belongs_to_many.push(declaration.into());
        self
    }

    /// Builder method adding a plain field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declarations of one relation kind, in declaration order.
    pub fn declarations(&self, kind: RelationKind) -> &[RelationDeclaration] {
        match kind {
            RelationKind::HasOne => &self.has_one,
            RelationKind::BelongsTo => &self.belongs_to,
            RelationKind::HasMany => &self.has_many,
            RelationKind::HasAndBelongsToMany => &self.has_and_belongs_to_many,
        }
    }
}

/// Finished, immutable schema of one entity.
#[derive(Debug)]
pub struct EntitySchema {
    name: String,
    fields: BTreeMap<String, Arc<dyn FieldDescriptor>>,
    defaults: BTreeMap<String, Value>,
    relations: BTreeMap<String, RelationDescriptor>,
    restricted: BTreeSet<String>,
    internal_prefix: String,
    join_entity: bool,
}

impl EntitySchema {
    /// Minimal join entity schema carrying only the given foreign keys.
    pub fn join(name: &str, keys: &[String], naming: &NamingConfig) -> Self {
        let fields = keys
            .iter()
            .map(|key| {
                let descriptor: Arc<dyn FieldDescriptor> = Arc::new(Field::new(key));
                (key.clone(), descriptor)
            })
            .collect();

        Self {
            name: name.to_string(),
            fields,
            defaults: BTreeMap::new(),
            relations: BTreeMap::new(),
            restricted: BTreeSet::new(),
            internal_prefix: naming.internal_prefix.clone(),
            join_entity: true,
        }
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor of a plain field.
    pub fn field(&self, name: &str) -> Option<&Arc<dyn FieldDescriptor>> {
        self.fields.get(name)
    }

    /// Descriptor table of all plain fields.
    pub fn fields(&self) -> &BTreeMap<String, Arc<dyn FieldDescriptor>> {
        &self.fields
    }

    /// Plain field names, sorted.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Declared default values.
    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// Descriptor of a relation field.
    pub fn relation(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations.get(field)
    }

    /// All relation descriptors keyed by field name.
    pub fn relations(&self) -> &BTreeMap<String, RelationDescriptor> {
        &self.relations
    }

    /// Relation field names, sorted.
    pub fn related_fields(&self) -> BTreeSet<String> {
        self.relations.keys().cloned().collect()
    }

    /// Whether `field` is a relation field.
    pub fn is_related(&self, field: &str) -> bool {
        self.relations.contains_key(field)
    }

    /// Keys that must never be accessed directly.
    pub fn restricted(&self) -> &BTreeSet<String> {
        &self.restricted
    }

    /// Whether `field` is restricted.
    pub fn is_restricted(&self, field: &str) -> bool {
        self.restricted.contains(field)
    }

    /// Prefix of internal field names.
    pub fn internal_prefix(&self) -> &str {
        &self.internal_prefix
    }

    /// Whether this schema was synthesized for a many-to-many relation.
    pub fn is_join_entity(&self) -> bool {
        self.join_entity
    }
}

/// Assembles entity definitions into schemas registered in a [`SchemaRegistry`].
pub struct SchemaBuilder<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaBuilder<'a> {
    /// Creates a builder registering into `registry`.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Builds and registers the schema for `definition`.
    ///
    /// # Errors
    /// - `Configuration` for malformed names, declarations or duplicate
    ///   field names; nothing is registered.
    /// - `DuplicateRegistration` when the entity name is taken; nothing is
    ///   registered.
    pub fn build(&self, definition: EntityDefinition) -> Result<Arc<EntitySchema>> {
        let naming = self.registry.naming();
        validate_entity_name(&definition.name, naming)?;
        let owner = definition.name.as_str();

        let mut taken = BTreeSet::new();
        let mut fields = BTreeMap::new();
        let mut defaults = BTreeMap::new();
        for spec in &definition.fields {
            if spec.name.trim().is_empty() {
                return Err(RemodelError::configuration(owner, "field name cannot be empty"));
            }
            if !taken.insert(spec.name.clone()) {
                return Err(RemodelError::configuration(
                    owner,
                    format!("field '{}' is declared more than once", spec.name),
                ));
            }
            fields.insert(spec.name.clone(), spec.descriptor());
            if let Some(default) = &spec.default {
                defaults.insert(spec.name.clone(), default.clone());
            }
        }

        let mut wired: Vec<WiredRelation> = Vec::new();
        for kind in RelationKind::ALL {
            for declaration in definition.declarations(kind) {
                let spec = parse_declaration(owner, kind, declaration, naming)?;
                if !taken.insert(spec.field.clone()) {
                    return Err(RemodelError::configuration(
                        owner,
                        format!(
                            "{} field '{}' is already used by another field or relation",
                            kind, spec.field
                        ),
                    ));
                }
                wired.push(build_descriptor(owner, kind, spec, naming)?);
            }
        }

        let restricted = wired
            .iter()
            .filter(|relation| relation.restricts_local_key())
            .map(|relation| relation.descriptor.local_key.clone())
            .collect();
        let relations = wired
            .iter()
            .map(|relation| (relation.descriptor.field.clone(), relation.descriptor.clone()))
            .collect();

        let schema = self.registry.create_entity(EntitySchema {
            name: definition.name.clone(),
            fields,
            defaults,
            relations,
            restricted,
            internal_prefix: naming.internal_prefix.clone(),
            join_entity: false,
        })?;

        for relation in &wired {
            relation.commit(self.registry)?;
        }

        tracing::debug!(
            "Defined entity {} with {} field(s), {} relation(s), {} restricted key(s)",
            schema.name(),
            schema.fields().len(),
            schema.relations().len(),
            schema.restricted().len()
        );

        Ok(schema)
    }
}

fn validate_entity_name(name: &str, naming: &NamingConfig) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RemodelError::configuration(name, "entity name cannot be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RemodelError::configuration(
            name,
            "entity name cannot contain whitespace",
        ));
    }
    if name.starts_with(&naming.join_prefix) {
        return Err(RemodelError::configuration(
            name,
            format!(
                "entity names starting with '{}' are reserved for join entities",
                naming.join_prefix
            ),
        ));
    }
    Ok(())
}
