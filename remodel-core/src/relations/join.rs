//! Join entities backing `has_and_belongs_to_many` relations.
//!
//! One join entity exists per unordered pair of entities, whichever side
//! declares the relation first.

use crate::config::NamingConfig;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::schema::EntitySchema;

/// Name of the join entity for a many-to-many pair.
///
/// The name is the join prefix followed by both entity names sorted and
/// concatenated, so `(Post, Tag)` and `(Tag, Post)` yield `_PostTag`.
pub fn join_entity_name(a: &str, b: &str, naming: &NamingConfig) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}{}{}", naming.join_prefix, first, second)
}

/// Makes sure the join entity for `(owner, other)` exists and returns its name.
///
/// The join entity only carries the two foreign keys. When the opposite end
/// of the relation was defined first the entity already exists; that
/// duplicate registration is expected and absorbed here. Every other error
/// propagates.
pub fn ensure_join_entity(registry: &SchemaRegistry, owner: &str, other: &str) -> Result<String> {
    let naming = registry.naming();
    let name = join_entity_name(owner, other, naming);
    let keys = [naming.foreign_key(owner), naming.foreign_key(other)];

    match registry.create_entity(EntitySchema::join(&name, &keys, naming)) {
        Ok(_) => {
            tracing::debug!("Synthesized join entity {} for {} <-> {}", name, owner, other);
            Ok(name)
        }
        Err(e) if e.is_duplicate_registration() => {
            tracing::debug!("Join entity {} already registered, reusing it", name);
            Ok(name)
        }
        Err(e) => Err(e),
    }
}
