//! Relation wiring integration tests.
//!
//! This test suite covers:
//! - belongs_to defaults, restricted keys and resolution
//! - has_one resolution through a non-primary remote key
//! - lazy has_many sets
//! - many-to-many join entity synthesis and resolution through join rows
//! - index registration across several entities
//!
//! All resolution runs against the in-memory store.

use remodel_core::{
    EntityDefinition, FieldAccessGuard, FieldOperation, FieldSpec, IndexEntry, MemoryStore,
    Record, RecordStore, Related, RelationDeclaration, RemodelError, Result, SchemaRegistry,
};
use serde_json::{Value, json};

/// Helper turning a JSON object literal into a record
fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

/// Helper collecting the `id` of each record
fn ids(records: &[Record]) -> Vec<Value> {
    records
        .iter()
        .filter_map(|record| record.get("id").cloned())
        .collect()
}

/// Blog schema shared by most tests: users write posts, posts carry tags.
fn blog_registry() -> Result<SchemaRegistry> {
    let registry = SchemaRegistry::new();
    registry.define(
        EntityDefinition::new("User")
            .has_one(RelationDeclaration::explicit("Profile", "profile", "id", "owner_id"))
            .has_many("Post")
            .field(FieldSpec::string("name")),
    )?;
    registry.define(
        EntityDefinition::new("Post")
            .belongs_to("User")
            .has_and_belongs_to_many("Tag")
            .field(FieldSpec::string("title")),
    )?;
    registry.define(EntityDefinition::new("Tag").has_and_belongs_to_many("Post"))?;
    registry.define(EntityDefinition::new("Profile").field(FieldSpec::string("bio")))?;
    Ok(registry)
}

fn blog_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert("User", record(json!({"id": 1, "name": "ada"})));
    store.insert("User", record(json!({"id": 2, "name": "grace"})));
    store.insert("Profile", record(json!({"id": 10, "owner_id": 1, "bio": "math"})));
    store.insert("Post", record(json!({"id": 100, "user_id": 1, "title": "Engines"})));
    store.insert("Post", record(json!({"id": 101, "user_id": 1, "title": "Notes"})));
    store.insert("Post", record(json!({"id": 102, "user_id": 2, "title": "Cobol"})));
    store.insert("Tag", record(json!({"id": 7, "label": "history"})));
    store.insert("Tag", record(json!({"id": 8, "label": "computing"})));
    store.insert("_PostTag", record(json!({"post_id": 100, "tag_id": 7})));
    store.insert("_PostTag", record(json!({"post_id": 100, "tag_id": 8})));
    store.insert("_PostTag", record(json!({"post_id": 102, "tag_id": 8})));
    store
}

// =============================================================================
// Schema Wiring Tests
// =============================================================================

#[test]
fn test_blog_schema_registers_expected_entities_and_indexes() -> Result<()> {
    let registry = blog_registry()?;

    assert_eq!(
        registry.entity_names(),
        vec!["Post", "Profile", "Tag", "User", "_PostTag"]
    );
    assert_eq!(
        registry.indexes().entries(),
        vec![
            IndexEntry::new("Post", "id"),
            IndexEntry::new("Post", "user_id"),
            IndexEntry::new("Profile", "owner_id"),
            IndexEntry::new("Tag", "id"),
            IndexEntry::new("_PostTag", "post_id"),
            IndexEntry::new("_PostTag", "tag_id"),
        ]
    );
    Ok(())
}

#[test]
fn test_belongs_to_key_is_hidden_from_callers() -> Result<()> {
    let registry = blog_registry()?;
    let post = registry.entity("Post").expect("Post is registered");
    let user = post.relation("user").expect("user relation");
    assert_eq!((user.local_key.as_str(), user.remote_key.as_str()), ("user_id", "id"));

    let fields = FieldAccessGuard::from_record(
        post,
        record(json!({"id": 100, "user_id": 1, "title": "Engines"})),
    );

    let error = fields.get("user_id").expect_err("restricted");
    assert!(matches!(
        error,
        RemodelError::RestrictedField { operation: FieldOperation::Get, .. }
    ));
    assert_eq!(error.to_string(), "Cannot access user_id: field is restricted");
    assert!(!fields.as_mapping().contains_key("user_id"));
    Ok(())
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_belongs_to_resolves_through_local_key() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let post = registry.entity("Post").expect("Post is registered");

    let fields = FieldAccessGuard::from_record(post, record(json!({"id": 102, "user_id": 2})));
    let user = fields.related("user", &store).await?.into_one();

    assert_eq!(user.and_then(|u| u.get("name").cloned()), Some(json!("grace")));
    Ok(())
}

#[tokio::test]
async fn test_relate_then_resolve_round_trip() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let post = registry.entity("Post").expect("Post is registered");

    let mut fields = FieldAccessGuard::new(post);
    fields.set("title", json!("Draft"))?;
    assert_eq!(fields.related("user", &store).await?, Related::One(None));
    assert_eq!(store.query_count(), 0);

    let ada = store.get("User", &json!(1)).await?.expect("seeded user");
    fields.relate("user", Some(&ada))?;
    let user = fields.related("user", &store).await?.into_one();
    assert_eq!(user.and_then(|u| u.get("name").cloned()), Some(json!("ada")));

    fields.relate("user", None)?;
    assert_eq!(fields.related("user", &store).await?, Related::One(None));
    Ok(())
}

#[tokio::test]
async fn test_has_one_resolves_through_remote_key() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let user = registry.entity("User").expect("User is registered");

    let ada = FieldAccessGuard::from_record(user.clone(), record(json!({"id": 1})));
    let profile = ada.related("profile", &store).await?.into_one();
    assert_eq!(profile.and_then(|p| p.get("bio").cloned()), Some(json!("math")));

    let grace = FieldAccessGuard::from_record(user, record(json!({"id": 2})));
    assert_eq!(grace.related("profile", &store).await?.into_one(), None);
    Ok(())
}

#[tokio::test]
async fn test_has_many_is_lazy_until_fetched() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let user = registry.entity("User").expect("User is registered");

    let ada = FieldAccessGuard::from_record(user, record(json!({"id": 1})));
    let Related::Many(posts) = ada.related("posts", &store).await? else {
        panic!("has_many resolves to a lazy set");
    };

    assert_eq!(store.query_count(), 0);
    assert_eq!(posts.entity(), "Post");
    assert_eq!(posts.key(), "user_id");
    assert_eq!(posts.value(), Some(&json!(1)));

    let fetched = posts.fetch(&store).await?;
    assert_eq!(ids(&fetched), vec![json!(100), json!(101)]);
    assert_eq!(store.query_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_habtm_resolves_through_join_rows_from_both_sides() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let post = registry.entity("Post").expect("Post is registered");
    let tag = registry.entity("Tag").expect("Tag is registered");

    let engines = FieldAccessGuard::from_record(post, record(json!({"id": 100})));
    let Related::Linked(tags) = engines.related("tags", &store).await? else {
        panic!("has_and_belongs_to_many resolves to linked records");
    };
    assert_eq!(ids(&tags), vec![json!(7), json!(8)]);

    let computing = FieldAccessGuard::from_record(tag, record(json!({"id": 8})));
    let Related::Linked(posts) = computing.related("posts", &store).await? else {
        panic!("has_and_belongs_to_many resolves to linked records");
    };
    assert_eq!(ids(&posts), vec![json!(100), json!(102)]);
    Ok(())
}

#[tokio::test]
async fn test_unsaved_instance_resolves_to_nothing_without_queries() -> Result<()> {
    let registry = blog_registry()?;
    let store = blog_store();
    let post = registry.entity("Post").expect("Post is registered");

    let draft = FieldAccessGuard::new(post);
    assert_eq!(draft.related("tags", &store).await?, Related::Linked(Vec::new()));
    assert_eq!(store.query_count(), 0);

    assert!(matches!(
        draft.related("title", &store).await,
        Err(RemodelError::Configuration { .. })
    ));
    Ok(())
}

// =============================================================================
// Definition Order Tests
// =============================================================================

#[test]
fn test_join_entity_is_shared_regardless_of_definition_order() -> Result<()> {
    let forward = SchemaRegistry::new();
    forward.define(EntityDefinition::new("Post").has_and_belongs_to_many("Tag"))?;
    forward.define(EntityDefinition::new("Tag").has_and_belongs_to_many("Post"))?;

    let backward = SchemaRegistry::new();
    backward.define(EntityDefinition::new("Tag").has_and_belongs_to_many("Post"))?;
    backward.define(EntityDefinition::new("Post").has_and_belongs_to_many("Tag"))?;

    assert_eq!(forward.entity_names(), backward.entity_names());
    assert_eq!(forward.indexes().entries(), backward.indexes().entries());
    assert_eq!(
        forward.entity_names().iter().filter(|name| name.starts_with('_')).count(),
        1
    );
    Ok(())
}
