//! Schema Normalizer
//!
//! Accepts the loosely-structured schema documents published alongside the
//! datasets and produces a uniform [`SchemaDocument`]. The field mapping may
//! live under `properties`, under `fields`, or be the document itself.

use super::type_mapper::declared_type_of;
use crate::core::{
    DeclaredType, FieldDescriptor, MirrorError, Result, SchemaDocument, StructuralHint,
};
use serde_json::{Map, Value as JsonValue};

/// Keys that may hold the field mapping, in priority order.
const MAPPING_KEYS: [&str; 2] = ["properties", "fields"];

/// Keys marking an entry as a reference to another schema.
const REFERENCE_KEYS: [&str; 2] = ["$ref", "ref"];

/// Keys marking an entry without `type` as a nested sub-schema.
const NESTED_KEYS: [&str; 3] = ["properties", "fields", "items"];

/// Field attributes whose values may be lists or objects without making
/// the entry a sub-schema.
const ATTRIBUTE_KEYS: [&str; 6] = [
    "enum",
    "default",
    "required",
    "unique",
    "description",
    "examples",
];

/// Parse schema JSON text and normalize it.
pub fn normalize_str(raw: &str) -> Result<SchemaDocument> {
    let value: JsonValue = serde_json::from_str(raw)?;
    normalize(&value)
}

/// Normalize a raw schema document.
pub fn normalize(raw: &JsonValue) -> Result<SchemaDocument> {
    let mapping = locate_mapping(raw)?;

    let fields = mapping
        .iter()
        .map(|(name, entry)| describe_field(name, entry))
        .collect::<Result<Vec<_>>>()?;

    Ok(SchemaDocument::new(fields))
}

fn locate_mapping(raw: &JsonValue) -> Result<&Map<String, JsonValue>> {
    let document = raw.as_object().ok_or_else(|| {
        MirrorError::SchemaShape(format!(
            "expected a JSON object, got {}",
            json_kind(raw)
        ))
    })?;

    MAPPING_KEYS
        .iter()
        .filter_map(|key| document.get(*key).and_then(JsonValue::as_object))
        .chain(std::iter::once(document))
        .find(|candidate| !candidate.is_empty())
        .ok_or_else(|| {
            let keys: Vec<&str> = document.keys().map(String::as_str).collect();
            MirrorError::SchemaShape(format!(
                "could not find a field mapping; schema keys: {:?}",
                keys
            ))
        })
}

fn describe_field(name: &str, entry: &JsonValue) -> Result<FieldDescriptor> {
    if name.is_empty() {
        return Err(MirrorError::SchemaShape(
            "field names must not be empty".to_string(),
        ));
    }

    let descriptor = match entry {
        JsonValue::Object(attributes) => {
            let mut field = FieldDescriptor::new(name, declared_type_of_entry(attributes));
            field.required = flag(attributes, "required");
            field.unique = flag(attributes, "unique");
            field.default = attributes.get("default").cloned();
            field
        }
        JsonValue::Array(_) => {
            FieldDescriptor::new(name, DeclaredType::Structure(StructuralHint::List))
        }
        _ => FieldDescriptor::new(name, DeclaredType::Opaque),
    };

    Ok(descriptor)
}

fn declared_type_of_entry(attributes: &Map<String, JsonValue>) -> DeclaredType {
    if let Some(declared) = attributes.get("type") {
        return declared_type_of(declared);
    }

    if REFERENCE_KEYS.iter().any(|key| attributes.contains_key(*key)) {
        return DeclaredType::Opaque;
    }

    if attributes.contains_key("items") {
        return DeclaredType::Structure(StructuralHint::List);
    }

    let nested = NESTED_KEYS.iter().any(|key| attributes.contains_key(*key))
        || attributes
            .iter()
            .filter(|(key, _)| !ATTRIBUTE_KEYS.contains(&key.as_str()))
            .any(|(_, value)| value.is_object() || value.is_array());

    if nested {
        DeclaredType::Structure(StructuralHint::Mapping)
    } else {
        DeclaredType::Missing
    }
}

fn flag(attributes: &Map<String, JsonValue>, key: &str) -> bool {
    attributes
        .get(key)
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
