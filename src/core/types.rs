use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Name of the surrogate identity column every provisioned table starts with.
pub const IDENTITY_COLUMN: &str = "id";

/// Name of the insertion timestamp column every provisioned table ends with.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// True for the two columns the provisioner adds on its own.
pub fn is_synthetic_column(name: &str) -> bool {
    name == IDENTITY_COLUMN || name == CREATED_AT_COLUMN
}

/// Relational column types a schema field can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    Text,
    Numeric,
    Boolean,
    Timestamp,
    /// Structured object/array data kept as a queryable JSON document.
    Document,
    Uuid,
}

impl StorageType {
    /// SQL spelling used in generated DDL.
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Document => "JSONB",
            Self::Uuid => "UUID",
        }
    }

    /// Name the catalog reports for this type (`pg_type.typname`).
    pub fn catalog_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
            Self::Boolean => "bool",
            Self::Timestamp => "timestamp",
            Self::Document => "jsonb",
            Self::Uuid => "uuid",
        }
    }

    /// Classify a catalog type name. Types this crate never emits but that a
    /// hand-edited table may carry are folded into the closest storage type.
    pub fn from_catalog_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" | "varchar" | "bpchar" | "name" | "citext" => Some(Self::Text),
            "numeric" | "int2" | "int4" | "int8" | "float4" | "float8" => Some(Self::Numeric),
            "bool" => Some(Self::Boolean),
            "timestamp" | "timestamptz" | "date" => Some(Self::Timestamp),
            "json" | "jsonb" => Some(Self::Document),
            "uuid" => Some(Self::Uuid),
            _ => None,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Shape found in place of a type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralHint {
    Mapping,
    List,
}

/// What a schema entry says about its type, before mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// A type string exactly as written in the source document.
    Named(String),
    /// A nested sub-schema or list literal.
    Structure(StructuralHint),
    /// A reference or a bare scalar entry; stored as text.
    Opaque,
    /// No type information at all; treated as `string`.
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: DeclaredType,
    pub required: bool,
    pub unique: bool,
    /// `Some(JsonValue::Null)` when the source explicitly defaults to null.
    pub default: Option<JsonValue>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Normalized schema: field descriptors in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    fields: Vec<FieldDescriptor>,
}

impl SchemaDocument {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A column as the store's catalog reports it at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    /// Catalog type name, e.g. `text`, `numeric`, `jsonb`.
    pub udt_name: String,
    /// Whether a single-column unique or primary key index covers the column.
    pub unique: bool,
}

impl LiveColumn {
    pub fn new(name: impl Into<String>, udt_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            udt_name: udt_name.into(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn storage_type(&self) -> Option<StorageType> {
        StorageType::from_catalog_name(&self.udt_name)
    }

    pub fn is_document(&self) -> bool {
        self.storage_type() == Some(StorageType::Document)
    }
}

/// Quote an identifier for SQL, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    let escaped = ident.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Quote a string literal for SQL, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
