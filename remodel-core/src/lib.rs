//! Relation wiring and field access control for record-mapping layers.
//!
//! Entities are described by an [`EntityDefinition`]: plain fields plus
//! `has_one`, `belongs_to`, `has_many` and `has_and_belongs_to_many`
//! declarations. Defining an entity through a [`SchemaRegistry`] turns each
//! declaration into a [`RelationDescriptor`], synthesizes the join entity of
//! every many-to-many pair, records the lookup keys that need indexing and
//! marks `belongs_to` foreign keys as restricted.
//!
//! Instances are held in a [`FieldAccessGuard`], which refuses direct
//! access to restricted keys; only the owning relation descriptor writes
//! them. Relations resolve against any [`RecordStore`].
//!
//! # Architecture
//! - Registries are explicit values, never process globals
//! - Definitions are validated completely before anything is registered
//! - Store access is async behind an object-safe trait

pub mod config;
pub mod error;
pub mod fields;
pub mod guard;
pub mod index;
pub mod inflect;
pub mod logging;
pub mod registry;
pub mod relations;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use config::NamingConfig;
pub use error::{FieldOperation, RemodelError, Result};
pub use fields::{Field, FieldDescriptor, FieldKind, FieldSpec, NumericField, StringField};
pub use guard::FieldAccessGuard;
pub use index::{IndexEntry, IndexRegistry};
pub use logging::init_logging;
pub use registry::SchemaRegistry;
pub use relations::{
    JoinTable, Related, RelatedSet, RelationDeclaration, RelationDescriptor, RelationKind,
    RelationSpec,
};
pub use schema::{EntityDefinition, EntitySchema, SchemaBuilder};
pub use store::{MemoryStore, Record, RecordStore};
