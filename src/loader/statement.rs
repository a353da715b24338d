//! Row write statements
//!
//! Every value travels to the store as text and is cast to the live column's
//! catalog type there, so one binding path serves any column type a table
//! may carry, including hand-edited ones.

use crate::core::{LiveColumn, quote_ident};
use serde_json::Value as JsonValue;

/// A parameter bound into a row write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue {
    Null,
    Text(String),
}

impl BoundValue {
    /// Convert a record value for a column.
    ///
    /// Mappings and lists are serialized to JSON text. Document columns
    /// receive every non-null value as a JSON document, so a bare string
    /// lands as a JSON string rather than failing the cast.
    pub fn from_json(value: &JsonValue, document_column: bool) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Text(value.to_string()),
            _ if document_column => Self::Text(value.to_string()),
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Bool(b) => Self::Text(b.to_string()),
            JsonValue::Number(n) => Self::Text(n.to_string()),
        }
    }

    pub fn as_param(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s.as_str()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// `INSERT` of one record, optionally resolving conflicts on a key column.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertStatement {
    pub table: String,
    pub columns: Vec<LiveColumn>,
    pub values: Vec<BoundValue>,
    pub conflict_key: Option<String>,
}

impl UpsertStatement {
    pub fn new(table: impl Into<String>, columns: Vec<LiveColumn>, values: Vec<BoundValue>) -> Self {
        Self {
            table: table.into(),
            columns,
            values,
            conflict_key: None,
        }
    }

    pub fn on_conflict(mut self, key: Option<String>) -> Self {
        self.conflict_key = key;
        self
    }

    pub fn value_of(&self, column: &str) -> Option<&BoundValue> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .map(|idx| &self.values[idx])
    }

    pub fn to_sql(&self) -> String {
        let column_list: Vec<String> = self.columns.iter().map(|c| quote_ident(&c.name)).collect();

        let placeholders: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("${}::text::{}", idx + 1, quote_ident(&column.udt_name)))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            column_list.join(", "),
            placeholders.join(", ")
        );

        if let Some(key) = &self.conflict_key {
            let assignments: Vec<String> = column_list
                .iter()
                .map(|col| format!("{} = EXCLUDED.{}", col, col))
                .collect();

            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                quote_ident(key),
                assignments.join(", ")
            ));
        }

        sql
    }
}
