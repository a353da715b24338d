//! Type Mapper
//!
//! Maps declared schema types to storage types. Mapping is total: an
//! unknown or malformed type never fails provisioning, it falls back to
//! TEXT.

use crate::core::{DeclaredType, StorageType, StructuralHint};
use serde_json::Value as JsonValue;

/// Map a declared type to the storage type of its column.
pub fn map_type(declared: &DeclaredType) -> StorageType {
    match declared {
        DeclaredType::Named(name) => map_type_name(name),
        DeclaredType::Structure(_) => StorageType::Document,
        DeclaredType::Opaque | DeclaredType::Missing => StorageType::Text,
    }
}

/// Map a type string, case-insensitively.
pub fn map_type_name(name: &str) -> StorageType {
    match name.trim().to_ascii_lowercase().as_str() {
        "string" => StorageType::Text,
        "number" => StorageType::Numeric,
        "boolean" => StorageType::Boolean,
        "date" => StorageType::Timestamp,
        "object" | "array" => StorageType::Document,
        "uuid" => StorageType::Uuid,
        _ => StorageType::Text,
    }
}

/// Turn a raw `type` value of any JSON shape into a declared type.
pub fn declared_type_of(value: &JsonValue) -> DeclaredType {
    match value {
        JsonValue::String(s) => DeclaredType::Named(s.clone()),
        JsonValue::Object(_) => DeclaredType::Structure(StructuralHint::Mapping),
        JsonValue::Array(_) => DeclaredType::Structure(StructuralHint::List),
        JsonValue::Null => DeclaredType::Missing,
        JsonValue::Bool(_) | JsonValue::Number(_) => DeclaredType::Named(value.to_string()),
    }
}

/// Map a raw `type` value of any JSON shape.
pub fn map_json_type(value: &JsonValue) -> StorageType {
    map_type(&declared_type_of(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closed_vocabulary() {
        assert_eq!(map_type_name("string"), StorageType::Text);
        assert_eq!(map_type_name("number"), StorageType::Numeric);
        assert_eq!(map_type_name("boolean"), StorageType::Boolean);
        assert_eq!(map_type_name("date"), StorageType::Timestamp);
        assert_eq!(map_type_name("object"), StorageType::Document);
        assert_eq!(map_type_name("array"), StorageType::Document);
        assert_eq!(map_type_name("uuid"), StorageType::Uuid);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(map_type_name("String"), StorageType::Text);
        assert_eq!(map_type_name("NUMBER"), StorageType::Numeric);
        assert_eq!(map_type_name("Boolean"), StorageType::Boolean);
        assert_eq!(map_type_name("UUID"), StorageType::Uuid);
        assert_eq!(map_type_name("Date"), StorageType::Timestamp);
    }

    #[test]
    fn test_uuid_is_never_a_document() {
        assert_ne!(map_type_name("uuid"), StorageType::Document);
        assert_ne!(map_type_name("uuid"), StorageType::Text);
    }

    #[test]
    fn test_unknown_falls_back_to_text() {
        for name in ["", "decimal", "Mixed", "ObjectId", "integer ", "💥"] {
            assert_eq!(map_type_name(name), StorageType::Text, "type {:?}", name);
        }
    }

    #[test]
    fn test_total_over_json_shapes() {
        assert_eq!(map_json_type(&json!(null)), StorageType::Text);
        assert_eq!(map_json_type(&json!(true)), StorageType::Text);
        assert_eq!(map_json_type(&json!(42)), StorageType::Text);
        assert_eq!(map_json_type(&json!("Number")), StorageType::Numeric);
        assert_eq!(map_json_type(&json!({"type": "String"})), StorageType::Document);
        assert_eq!(map_json_type(&json!(["String"])), StorageType::Document);
    }

    #[test]
    fn test_opaque_and_missing_are_text() {
        assert_eq!(map_type(&DeclaredType::Opaque), StorageType::Text);
        assert_eq!(map_type(&DeclaredType::Missing), StorageType::Text);
        assert_eq!(
            map_type(&DeclaredType::Structure(StructuralHint::List)),
            StorageType::Document
        );
    }
}
