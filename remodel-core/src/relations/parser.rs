//! Normalization of relation declarations into [`RelationSpec`]s.

use super::{RelationDeclaration, RelationKind};
use crate::config::NamingConfig;
use crate::error::{RemodelError, Result};
use crate::inflect::tableize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A relation declaration normalized to `(other, field, local_key, remote_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Related entity name
    pub other: String,
    /// Relation field name on the owner
    pub field: String,
    /// Key read from the owner
    pub local_key: String,
    /// Key matched on the related entity
    pub remote_key: String,
}

/// Normalizes one declaration of `owner`, applying naming conventions to
/// bare references.
///
/// | kind | field | local_key | remote_key |
/// |---|---|---|---|
/// | has_one | lower(other) | `id` | `<lower(owner)>_id` |
/// | belongs_to | lower(other) | `<lower(other)>_id` | `id` |
/// | has_many | tableize(other) | `id` | `<lower(owner)>_id` |
/// | has_and_belongs_to_many | tableize(other) | `id` | `id` |
///
/// # Errors
/// Returns a configuration error naming the owner and kind when the
/// declaration is neither a non-empty entity name nor a tuple of four
/// non-empty strings.
pub fn parse_declaration(
    owner: &str,
    kind: RelationKind,
    declaration: &RelationDeclaration,
    naming: &NamingConfig,
) -> Result<RelationSpec> {
    match declaration {
        RelationDeclaration::Reference(other) if !other.trim().is_empty() => {
            Ok(conventional(owner, kind, other, naming))
        }
        RelationDeclaration::Reference(_) => Err(malformed(
            owner,
            kind,
            "related entity name cannot be empty",
        )),
        RelationDeclaration::Tuple(parts) => explicit(owner, kind, parts),
        RelationDeclaration::Unrecognized(value) => Err(malformed(
            owner,
            kind,
            format!(
                "expected an entity name or a (other, field, local_key, remote_key) tuple, got {}",
                value
            ),
        )),
    }
}

fn conventional(owner: &str, kind: RelationKind, other: &str, naming: &NamingConfig) -> RelationSpec {
    let (field, local_key, remote_key) = match kind {
        RelationKind::HasOne => (
            other.to_lowercase(),
            naming.primary_key.clone(),
            naming.foreign_key(owner),
        ),
        RelationKind::BelongsTo => (
            other.to_lowercase(),
            naming.foreign_key(other),
            naming.primary_key.clone(),
        ),
        RelationKind::HasMany => (
            tableize(other),
            naming.primary_key.clone(),
            naming.foreign_key(owner),
        ),
        RelationKind::HasAndBelongsToMany => (
            tableize(other),
            naming.primary_key.clone(),
            naming.primary_key.clone(),
        ),
    };

    RelationSpec {
        other: other.to_string(),
        field,
        local_key,
        remote_key,
    }
}

fn explicit(owner: &str, kind: RelationKind, parts: &[Value]) -> Result<RelationSpec> {
    let [other, field, local_key, remote_key] = parts else {
        return Err(malformed(
            owner,
            kind,
            format!(
                "explicit relation tuple needs 4 elements (other, field, local_key, remote_key), got {}",
                parts.len()
            ),
        ));
    };

    let text = |position: &str, value: &Value| -> Result<String> {
        match value.as_str() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(malformed(
                owner,
                kind,
                format!("tuple element '{}' must be a non-empty string, got {}", position, value),
            )),
        }
    };

    Ok(RelationSpec {
        other: text("other", other)?,
        field: text("field", field)?,
        local_key: text("local_key", local_key)?,
        remote_key: text("remote_key", remote_key)?,
    })
}

fn malformed(owner: &str, kind: RelationKind, detail: impl AsRef<str>) -> RemodelError {
    RemodelError::configuration(
        owner,
        format!("malformed {} declaration: {}", kind, detail.as_ref()),
    )
}
