use serde_json::json;
use std::sync::Arc;
use tablemirror::{
    DdlOptions, DeclaredType, MemoryStore, Mirror, MirrorError, StorageType, StructuralHint,
    generate_ddl, normalize,
};

#[test]
fn test_schema_forms_normalize_identically() {
    let fields = json!({
        "name": {"type": "String", "required": true, "unique": true},
        "mass_kg": {"type": "Number"},
        "reused": {"type": "Boolean", "default": false}
    });

    let bare = normalize(&fields).unwrap();
    let properties = normalize(&json!({"properties": fields.clone()})).unwrap();
    let wrapped = normalize(&json!({"fields": fields.clone()})).unwrap();

    assert_eq!(bare, properties);
    assert_eq!(bare, wrapped);
    assert_eq!(bare.field_names(), vec!["name", "mass_kg", "reused"]);
}

#[test]
fn test_structural_entries() {
    let schema = normalize(&json!({
        "cores": [{"core": {"type": "UUID"}, "flight": {"type": "Number"}}],
        "fairings": {"reused": {"type": "Boolean"}},
        "rocket": {"type": "UUID", "ref": "Rockets"},
        "links": {"patch": {"small": {"type": "String"}}},
        "note": "free text"
    }))
    .unwrap();

    let cores = schema.get("cores").unwrap();
    assert_eq!(cores.declared_type, DeclaredType::Structure(StructuralHint::List));

    let definition = generate_ddl("launches", &schema, &DdlOptions::default()).unwrap();
    let types: Vec<(&str, StorageType)> = definition
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.storage_type))
        .collect();

    assert_eq!(
        types,
        vec![
            ("cores", StorageType::Document),
            ("fairings", StorageType::Document),
            ("rocket", StorageType::Uuid),
            ("links", StorageType::Document),
            ("note", StorageType::Text),
        ]
    );
}

#[test]
fn test_capsules_definition() {
    let schema = normalize(&json!({
        "name": {"type": "String", "required": true},
        "mass_kg": {"type": "Number"},
        "reused": {"type": "Boolean", "default": false}
    }))
    .unwrap();

    let definition = generate_ddl("capsules", &schema, &DdlOptions::default()).unwrap();
    assert_eq!(
        definition.create_table_sql(),
        "CREATE TABLE IF NOT EXISTS \"capsules\" (\
         \"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, \
         \"name\" TEXT NOT NULL, \
         \"mass_kg\" NUMERIC, \
         \"reused\" BOOLEAN DEFAULT false, \
         \"created_at\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)"
    );
    assert_eq!(definition.statements().len(), 1);
}

#[tokio::test]
async fn test_provision_twice_keeps_one_table() {
    let store = MemoryStore::new();
    let mirror = Mirror::new(Arc::new(store.clone()));
    let schema = json!({"properties": {"name": {"type": "String"}}});

    mirror.provision("rockets", &schema).await.unwrap();
    mirror.provision("rockets", &schema).await.unwrap();

    assert_eq!(store.table_names().await, vec!["rockets".to_string()]);
    assert_eq!(
        store.column_names("rockets").await.unwrap(),
        vec!["id", "name", "created_at"]
    );
}

#[tokio::test]
async fn test_provision_keeps_existing_shape() {
    let store = MemoryStore::new();
    let mirror = Mirror::new(Arc::new(store.clone()));

    mirror
        .provision("ships", &json!({"name": {"type": "String"}}))
        .await
        .unwrap();
    mirror
        .provision(
            "ships",
            &json!({"name": {"type": "String"}, "port": {"type": "String"}}),
        )
        .await
        .unwrap();

    assert_eq!(
        store.column_names("ships").await.unwrap(),
        vec!["id", "name", "created_at"]
    );
}

#[tokio::test]
async fn test_uuid_columns_enable_extension() {
    let store = MemoryStore::new();
    let mirror = Mirror::new(Arc::new(store.clone()));

    let definition = mirror
        .provision(
            "launches",
            &json!({"rocket": {"type": "UUID"}, "name": {"type": "String", "unique": true}}),
        )
        .await
        .unwrap();

    assert_eq!(
        definition.prelude,
        vec!["CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"".to_string()]
    );
    assert!(store.has_extension("uuid-ossp").await);

    mirror
        .load(
            "launches",
            &json!({"rocket": "5E9D0D95-EDA6-9C3D-8E7B-1B1C1A4BE07D", "name": "FalconSat"}),
        )
        .await
        .unwrap();

    let rows = store.rows("launches").await.unwrap();
    assert_eq!(rows[0]["rocket"], json!("5e9d0d95-eda6-9c3d-8e7b-1b1c1a4be07d"));

    let err = mirror
        .load("launches", &json!({"rocket": "not-a-uuid", "name": "Trailblazer"}))
        .await
        .unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_object_id_references_need_text_columns() {
    let store = MemoryStore::new();
    let mirror = Mirror::new(Arc::new(store.clone()));
    let record = json!({"rocket": "5e9d0d95eda69973a809d1ec", "name": "FalconSat"});

    mirror
        .provision("launches", &json!({"rocket": {"type": "UUID"}, "name": {"type": "String"}}))
        .await
        .unwrap();
    let err = mirror.load("launches", &record).await.unwrap_err();
    assert!(err.is_store_error());
    assert_eq!(store.row_count("launches").await.unwrap(), 0);

    // A schema edited to declare the reference as a string loads it verbatim.
    mirror
        .provision("payloads", &json!({"rocket": {"type": "String"}, "name": {"type": "String"}}))
        .await
        .unwrap();
    mirror.load("payloads", &record).await.unwrap();
    let rows = store.rows("payloads").await.unwrap();
    assert_eq!(rows[0]["rocket"], json!("5e9d0d95eda69973a809d1ec"));
}

#[tokio::test]
async fn test_unusable_schemas() {
    let mirror = Mirror::new(Arc::new(MemoryStore::new()));

    assert!(matches!(
        mirror.provision("t", &json!([1, 2])).await,
        Err(MirrorError::SchemaShape(_))
    ));
    assert!(matches!(
        mirror
            .provision("t", &json!({"id": {"type": "String"}, "created_at": {"type": "Date"}}))
            .await,
        Err(MirrorError::EmptyColumnSet(name)) if name == "t"
    ));
}

#[tokio::test]
async fn test_provision_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capsules_schema.json");
    std::fs::write(&path, r#"{"serial": {"type": "String", "unique": true}}"#).unwrap();

    let store = MemoryStore::new();
    let mirror = Mirror::new(Arc::new(store.clone()));
    mirror.provision_file("capsules", &path).await.unwrap();

    assert!(store.table_exists("capsules").await);
}
