//! Relation declarations and their wiring into descriptors.
//!
//! This module contains the pieces the schema builder runs per relation:
//! - `parser`: normalizes a declaration into a [`RelationSpec`]
//! - `join`: synthesizes join entities for many-to-many relations
//! - `descriptor`: builds [`RelationDescriptor`]s and resolves them

mod descriptor;
mod join;
mod parser;

pub use descriptor::{JoinTable, Related, RelatedSet, RelationDescriptor, WiredRelation, build_descriptor};
pub use join::{ensure_join_entity, join_entity_name};
pub use parser::{RelationSpec, parse_declaration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The four supported relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// One related record holding a key that points back at the owner
    HasOne,
    /// The owner holds the foreign key of one related record
    BelongsTo,
    /// Many related records holding a key that points back at the owner
    HasMany,
    /// Many-to-many through a synthesized join entity
    HasAndBelongsToMany,
}

impl RelationKind {
    /// All kinds in declaration-processing order.
    pub const ALL: [RelationKind; 4] = [
        RelationKind::HasOne,
        RelationKind::BelongsTo,
        RelationKind::HasMany,
        RelationKind::HasAndBelongsToMany,
    ];

    /// Declaration keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::HasOne => "has_one",
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasMany => "has_many",
            RelationKind::HasAndBelongsToMany => "has_and_belongs_to_many",
        }
    }

    /// Whether resolution yields a collection rather than a single record.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            RelationKind::HasMany | RelationKind::HasAndBelongsToMany
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation declaration as written in an entity definition.
///
/// The accepted shapes are a bare entity name (`"User"`) and an explicit
/// tuple `["User", "author", "author_id", "id"]` of
/// `(other, field, local_key, remote_key)`. Any other shape is kept as
/// [`RelationDeclaration::Unrecognized`] and rejected by the parser, which
/// knows the owning entity and relation kind to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationDeclaration {
    /// Bare reference to the related entity
    Reference(String),
    /// Explicit `(other, field, local_key, remote_key)` tuple
    Tuple(Vec<Value>),
    /// Anything else
    Unrecognized(Value),
}

impl RelationDeclaration {
    /// Declares a relation with every name spelled out.
    pub fn explicit(
        other: impl Into<String>,
        field: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Self::Tuple(vec![
            Value::String(other.into()),
            Value::String(field.into()),
            Value::String(local_key.into()),
            Value::String(remote_key.into()),
        ])
    }
}

impl From<&str> for RelationDeclaration {
    fn from(other: &str) -> Self {
        Self::Reference(other.to_string())
    }
}

impl From<String> for RelationDeclaration {
    fn from(other: String) -> Self {
        Self::Reference(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relation_kind_display() {
        let rendered: Vec<String> = RelationKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["has_one", "belongs_to", "has_many", "has_and_belongs_to_many"]
        );
        assert!(RelationKind::HasMany.is_collection());
        assert!(!RelationKind::BelongsTo.is_collection());
    }

    #[test]
    fn test_declaration_shapes_from_json() {
        let bare: RelationDeclaration = serde_json::from_value(json!("User")).expect("deserialize");
        assert_eq!(bare, RelationDeclaration::from("User"));

        let tuple: RelationDeclaration =
            serde_json::from_value(json!(["User", "author", "author_id", "id"]))
                .expect("deserialize");
        assert_eq!(
            tuple,
            RelationDeclaration::explicit("User", "author", "author_id", "id")
        );

        let other: RelationDeclaration =
            serde_json::from_value(json!({"other": "User"})).expect("deserialize");
        assert!(matches!(other, RelationDeclaration::Unrecognized(_)));

        let number: RelationDeclaration = serde_json::from_value(json!(42)).expect("deserialize");
        assert!(matches!(number, RelationDeclaration::Unrecognized(_)));
    }
}
