//! Relation descriptors: wiring at definition time, resolution per instance.
//!
//! [`build_descriptor`] is pure; the registry side effects it implies are
//! carried in a [`WiredRelation`] and applied by [`WiredRelation::commit`].

use super::{RelationKind, RelationSpec, ensure_join_entity, join_entity_name};
use crate::config::NamingConfig;
use crate::error::{RemodelError, Result};
use crate::guard::FieldAccessGuard;
use crate::index::IndexEntry;
use crate::registry::SchemaRegistry;
use crate::store::{Record, RecordStore};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Join entity wiring of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTable {
    /// Join entity name
    pub entity: String,
    /// Join key pointing at the owner
    pub local_key: String,
    /// Join key pointing at the related entity
    pub remote_key: String,
}

/// Concrete wiring of one relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation kind
    pub kind: RelationKind,
    /// Entity declaring the relation
    pub owner: String,
    /// Relation field name on the owner
    pub field: String,
    /// Related entity
    pub other: String,
    /// Key read from the owner instance
    pub local_key: String,
    /// Key matched on the related entity
    pub remote_key: String,
    /// Join entity, for many-to-many relations only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinTable>,
}

/// A descriptor together with the registry side effects it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiredRelation {
    /// The finished descriptor
    pub descriptor: RelationDescriptor,
    /// Index entries the opposite side needs for its lookups
    pub indexes: Vec<IndexEntry>,
}

impl WiredRelation {
    /// Whether the owner's local key is restricted to the descriptor.
    pub fn restricts_local_key(&self) -> bool {
        self.descriptor.kind == RelationKind::BelongsTo
    }

    /// Applies the registry side effects: join entity synthesis (many-to-many
    /// only) followed by index registration.
    pub fn commit(&self, registry: &SchemaRegistry) -> Result<()> {
        if self.descriptor.kind == RelationKind::HasAndBelongsToMany {
            ensure_join_entity(registry, &self.descriptor.owner, &self.descriptor.other)?;
        }

        for entry in &self.indexes {
            registry.indexes().insert(entry.clone());
        }

        Ok(())
    }
}

/// Builds the descriptor for a normalized relation of `owner`.
///
/// Index entries per kind:
/// - has_one, has_many: `(other, remote_key)`
/// - belongs_to: `(owner, local_key)`
/// - has_and_belongs_to_many: `(other, remote_key)` and both join keys
///
/// # Errors
/// Returns a configuration error for a many-to-many relation of an entity
/// with itself, whose two join keys would collide.
pub fn build_descriptor(
    owner: &str,
    kind: RelationKind,
    spec: RelationSpec,
    naming: &NamingConfig,
) -> Result<WiredRelation> {
    let RelationSpec {
        other,
        field,
        local_key,
        remote_key,
    } = spec;

    let (join, indexes) = match kind {
        RelationKind::HasOne | RelationKind::HasMany => {
            (None, vec![IndexEntry::new(&other, &remote_key)])
        }
        RelationKind::BelongsTo => (None, vec![IndexEntry::new(owner, &local_key)]),
        RelationKind::HasAndBelongsToMany => {
            let join = JoinTable {
                entity: join_entity_name(owner, &other, naming),
                local_key: naming.foreign_key(owner),
                remote_key: naming.foreign_key(&other),
            };
            if join.local_key == join.remote_key {
                return Err(RemodelError::configuration(
                    owner,
                    format!(
                        "{} '{}' relates the entity to itself; both join keys would be '{}'",
                        kind, field, join.local_key
                    ),
                ));
            }
            let indexes = vec![
                IndexEntry::new(&other, &remote_key),
                IndexEntry::new(&join.entity, &join.local_key),
                IndexEntry::new(&join.entity, &join.remote_key),
            ];
            (Some(join), indexes)
        }
    };

    Ok(WiredRelation {
        descriptor: RelationDescriptor {
            kind,
            owner: owner.to_string(),
            field,
            other,
            local_key,
            remote_key,
            join,
        },
        indexes,
    })
}

/// Result of resolving a relation field on an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// has_one / belongs_to: the related record, if any
    One(Option<Record>),
    /// has_many: a lazy query over the related records
    Many(RelatedSet),
    /// has_and_belongs_to_many: records reached through the join entity
    Linked(Vec<Record>),
}

impl Related {
    /// The single related record, for has_one / belongs_to results.
    pub fn into_one(self) -> Option<Record> {
        match self {
            Related::One(record) => record,
            Related::Many(_) | Related::Linked(_) => None,
        }
    }
}

/// Lazy has_many result: `other where key == value`.
///
/// Nothing is fetched until [`RelatedSet::fetch`] is awaited.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedSet {
    entity: String,
    key: String,
    value: Option<Value>,
}

impl RelatedSet {
    /// Related entity being queried.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Key the query filters on.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value the key must equal; `None` when the owner has no local value.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Runs the query against the store.
    pub async fn fetch(&self, store: &dyn RecordStore) -> Result<Vec<Record>> {
        match &self.value {
            Some(value) => store.find_by(&self.entity, &self.key, value).await,
            None => Ok(Vec::new()),
        }
    }
}

impl RelationDescriptor {
    /// Resolves this relation for `instance`.
    ///
    /// An instance without a value for the local key resolves to nothing
    /// without querying the store.
    pub async fn resolve(
        &self,
        instance: &FieldAccessGuard,
        store: &dyn RecordStore,
    ) -> Result<Related> {
        self.check_owner(instance)?;
        let value = instance
            .get_internal(&self.local_key)
            .filter(|value| !value.is_null())
            .cloned();

        match self.kind {
            RelationKind::HasOne | RelationKind::BelongsTo => {
                let Some(value) = value else {
                    return Ok(Related::One(None));
                };
                Ok(Related::One(self.fetch_one(store, &value).await?))
            }
            RelationKind::HasMany => Ok(Related::Many(RelatedSet {
                entity: self.other.clone(),
                key: self.remote_key.clone(),
                value,
            })),
            RelationKind::HasAndBelongsToMany => {
                let Some(value) = value else {
                    return Ok(Related::Linked(Vec::new()));
                };
                Ok(Related::Linked(self.fetch_linked(store, &value).await?))
            }
        }
    }

    /// Points a belongs_to relation at `related`, or clears it with `None`.
    ///
    /// This is the only sanctioned writer of the restricted local key.
    pub fn assign(&self, instance: &mut FieldAccessGuard, related: Option<&Record>) -> Result<()> {
        self.check_owner(instance)?;
        if self.kind != RelationKind::BelongsTo {
            return Err(RemodelError::configuration(
                &self.owner,
                format!("{} '{}' cannot be assigned directly", self.kind, self.field),
            ));
        }

        match related {
            Some(record) => {
                let value = record
                    .get(&self.remote_key)
                    .filter(|value| !value.is_null())
                    .cloned()
                    .ok_or_else(|| {
                        RemodelError::validation(format!(
                            "{} record has no {} to assign to {}",
                            self.other, self.remote_key, self.field
                        ))
                    })?;
                instance.set_internal(&self.local_key, value);
            }
            None => {
                instance.delete_internal(&self.local_key);
            }
        }

        Ok(())
    }

    fn check_owner(&self, instance: &FieldAccessGuard) -> Result<()> {
        if instance.schema().name() == self.owner {
            return Ok(());
        }
        Err(RemodelError::configuration(
            &self.owner,
            format!(
                "relation '{}' used on an instance of '{}'",
                self.field,
                instance.schema().name()
            ),
        ))
    }

    // Always a key lookup: the store's own primary key need not follow the
    // registry's naming.
    async fn fetch_one(&self, store: &dyn RecordStore, value: &Value) -> Result<Option<Record>> {
        Ok(store
            .find_by(&self.other, &self.remote_key, value)
            .await?
            .into_iter()
            .next())
    }

    async fn fetch_linked(&self, store: &dyn RecordStore, value: &Value) -> Result<Vec<Record>> {
        let Some(join) = &self.join else {
            return Err(RemodelError::configuration(
                &self.owner,
                format!("{} '{}' has no join entity", self.kind, self.field),
            ));
        };

        let rows = store.find_by(&join.entity, &join.local_key, value).await?;
        let remote_values: Vec<&Value> = rows
            .iter()
            .filter_map(|row| row.get(&join.remote_key))
            .filter(|value| !value.is_null())
            .collect();

        let batches = try_join_all(
            remote_values
                .into_iter()
                .map(|remote| store.find_by(&self.other, &self.remote_key, remote)),
        )
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}
