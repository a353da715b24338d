//! DDL Generator
//!
//! Turns a [`SchemaDocument`] into a [`TableDefinition`]: the schema-derived
//! columns wrapped by a surrogate identity column and an insertion timestamp,
//! plus any prelude statements the column types need.

use super::type_mapper::map_type;
use crate::core::{
    CREATED_AT_COLUMN, IDENTITY_COLUMN, MirrorError, Result, SchemaDocument, StorageType,
    is_synthetic_column, quote_ident, quote_literal,
};
use serde_json::Value as JsonValue;
use tracing::warn;

/// Knobs for DDL generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlOptions {
    /// Extension enabled before creating a table with UUID columns.
    /// `None` skips the prelude (the type is built into PostgreSQL 13+).
    pub uuid_extension: Option<String>,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self {
            uuid_extension: Some("uuid-ossp".to_string()),
        }
    }
}

/// One schema-derived column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub storage_type: StorageType,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<JsonValue>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            name: name.into(),
            storage_type,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    /// `"name" TYPE[ NOT NULL][ UNIQUE][ DEFAULT literal]`
    pub fn to_sql(&self) -> String {
        let mut parts = vec![quote_ident(&self.name), self.storage_type.sql_name().to_string()];

        if self.not_null {
            parts.push("NOT NULL".to_string());
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if let Some(default) = &self.default {
            parts.push(format!("DEFAULT {}", default_literal(default)));
        }

        parts.join(" ")
    }
}

/// A provisionable table: what `CREATE TABLE IF NOT EXISTS` will realize.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Idempotent statements that must run before the table statement.
    pub prelude: Vec<String>,
    /// Extensions named by the prelude, for stores that track them.
    pub extensions: Vec<String>,
}

impl TableDefinition {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Column definitions in table order, synthetic columns included.
    pub fn column_definitions(&self) -> Vec<String> {
        let mut definitions = Vec::with_capacity(self.columns.len() + 2);
        definitions.push(format!(
            "{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
            quote_ident(IDENTITY_COLUMN)
        ));
        definitions.extend(self.columns.iter().map(ColumnSpec::to_sql));
        definitions.push(format!(
            "{} TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP",
            quote_ident(CREATED_AT_COLUMN)
        ));
        definitions
    }

    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            self.column_definitions().join(", ")
        )
    }

    /// Prelude followed by the table statement, in execution order.
    pub fn statements(&self) -> Vec<String> {
        let mut statements = self.prelude.clone();
        statements.push(self.create_table_sql());
        statements
    }
}

/// Generate the table definition for a normalized schema.
pub fn generate_ddl(
    table_name: &str,
    schema: &SchemaDocument,
    options: &DdlOptions,
) -> Result<TableDefinition> {
    let mut columns = Vec::with_capacity(schema.len());

    for field in schema.fields() {
        if is_synthetic_column(&field.name) {
            warn!(
                table = table_name,
                field = %field.name,
                "Skipping schema field that collides with a generated column"
            );
            continue;
        }

        columns.push(ColumnSpec {
            name: field.name.clone(),
            storage_type: map_type(&field.declared_type),
            not_null: field.required,
            unique: field.unique,
            default: field.default.clone(),
        });
    }

    if columns.is_empty() {
        return Err(MirrorError::EmptyColumnSet(table_name.to_string()));
    }

    let mut prelude = Vec::new();
    let mut extensions = Vec::new();
    let needs_uuid = columns
        .iter()
        .any(|column| column.storage_type == StorageType::Uuid);

    if let (true, Some(extension)) = (needs_uuid, &options.uuid_extension) {
        prelude.push(format!(
            "CREATE EXTENSION IF NOT EXISTS {}",
            quote_ident(extension)
        ));
        extensions.push(extension.clone());
    }

    Ok(TableDefinition {
        name: table_name.to_string(),
        columns,
        prelude,
        extensions,
    })
}

fn default_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => quote_literal(s),
        JsonValue::Array(_) | JsonValue::Object(_) => quote_literal(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclaredType, FieldDescriptor};
    use crate::schema::normalize;
    use serde_json::json;

    fn capsules_schema() -> SchemaDocument {
        normalize(&json!({
            "name": {"type": "string", "required": true},
            "mass_kg": {"type": "number"},
            "reused": {"type": "boolean", "default": false}
        }))
        .unwrap()
    }

    #[test]
    fn test_capsules_column_specs() {
        let table = generate_ddl("capsules", &capsules_schema(), &DdlOptions::default()).unwrap();

        assert_eq!(
            table.column_definitions(),
            vec![
                "\"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY".to_string(),
                "\"name\" TEXT NOT NULL".to_string(),
                "\"mass_kg\" NUMERIC".to_string(),
                "\"reused\" BOOLEAN DEFAULT false".to_string(),
                "\"created_at\" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string(),
            ]
        );
        assert!(table.prelude.is_empty());
    }

    #[test]
    fn test_create_table_is_idempotent_statement() {
        let table = generate_ddl("capsules", &capsules_schema(), &DdlOptions::default()).unwrap();
        let sql = table.create_table_sql();

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"capsules\" ("));
        assert!(sql.ends_with("DEFAULT CURRENT_TIMESTAMP)"));
    }

    #[test]
    fn test_constraint_order_and_defaults() {
        let schema = SchemaDocument::new(vec![
            FieldDescriptor::new("serial", DeclaredType::Named("String".into()))
                .required()
                .unique()
                .with_default(json!("C1'01")),
            FieldDescriptor::new("launch", DeclaredType::Named("date".into()))
                .with_default(JsonValue::Null),
            FieldDescriptor::new("meta", DeclaredType::Named("object".into()))
                .with_default(json!({"a": 1})),
        ]);

        let table = generate_ddl("cores", &schema, &DdlOptions::default()).unwrap();

        assert_eq!(
            table.columns[0].to_sql(),
            "\"serial\" TEXT NOT NULL UNIQUE DEFAULT 'C1''01'"
        );
        assert_eq!(table.columns[1].to_sql(), "\"launch\" TIMESTAMP DEFAULT NULL");
        assert_eq!(table.columns[2].to_sql(), "\"meta\" JSONB DEFAULT '{\"a\":1}'");
    }

    #[test]
    fn test_uuid_column_adds_extension_prelude() {
        let schema = normalize(&json!({
            "rocket": {"type": "UUID"},
            "name": {"type": "String"}
        }))
        .unwrap();

        let table = generate_ddl("launches", &schema, &DdlOptions::default()).unwrap();
        assert_eq!(table.columns[0].storage_type, StorageType::Uuid);
        assert_eq!(
            table.prelude,
            vec!["CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"".to_string()]
        );
        assert_eq!(table.statements().len(), 2);

        let no_ext = DdlOptions { uuid_extension: None };
        let table = generate_ddl("launches", &schema, &no_ext).unwrap();
        assert!(table.prelude.is_empty());
    }

    #[test]
    fn test_reserved_and_mixed_case_names_are_quoted() {
        let schema = normalize(&json!({"order": {"type": "number"}, "dateUtc": {"type": "date"}})).unwrap();
        let sql = generate_ddl("Launches", &schema, &DdlOptions::default())
            .unwrap()
            .create_table_sql();

        assert!(sql.contains("\"Launches\""));
        assert!(sql.contains("\"order\" NUMERIC"));
        assert!(sql.contains("\"dateUtc\" TIMESTAMP"));
    }

    #[test]
    fn test_synthetic_names_are_skipped() {
        let schema = normalize(&json!({
            "id": {"type": "UUID"},
            "name": {"type": "String"}
        }))
        .unwrap();

        let table = generate_ddl("rockets", &schema, &DdlOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
        assert!(table.prelude.is_empty());
    }

    #[test]
    fn test_empty_column_set() {
        let schema = normalize(&json!({"id": {"type": "String"}})).unwrap();
        assert!(matches!(
            generate_ddl("t", &schema, &DdlOptions::default()),
            Err(MirrorError::EmptyColumnSet(name)) if name == "t"
        ));

        assert!(matches!(
            generate_ddl("t", &SchemaDocument::default(), &DdlOptions::default()),
            Err(MirrorError::EmptyColumnSet(_))
        ));
    }
}
