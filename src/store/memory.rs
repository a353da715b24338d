//! In-memory store
//!
//! Honours the same SQL-level contract as the PostgreSQL backend: idempotent
//! table creation, a live column catalog, text parameters cast to the column
//! type, NOT NULL and UNIQUE checks, `ON CONFLICT` resolution and
//! session-scoped transactions. Used for dry runs and tests.

use super::{RelationalStore, StoreSession};
use crate::core::{
    CREATED_AT_COLUMN, IDENTITY_COLUMN, LiveColumn, MirrorError, Result, StorageType,
};
use crate::loader::{BoundValue, UpsertStatement};
use crate::schema::TableDefinition;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct MemoryColumn {
    name: String,
    storage_type: StorageType,
    not_null: bool,
    unique: bool,
    default: Option<JsonValue>,
}

#[derive(Debug, Clone)]
struct MemoryRow {
    id: i64,
    values: Vec<JsonValue>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<MemoryColumn>,
    rows: Vec<MemoryRow>,
    next_id: i64,
}

#[derive(Debug, Clone, Default)]
struct Database {
    tables: HashMap<String, MemoryTable>,
    extensions: BTreeSet<String>,
}

/// Shared in-memory database. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Database>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn table_exists(&self, table: &str) -> bool {
        self.state.lock().await.tables.contains_key(table)
    }

    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn has_extension(&self, name: &str) -> bool {
        self.state.lock().await.extensions.contains(name)
    }

    /// Column names in table order, synthetic columns included.
    pub async fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let db = self.state.lock().await;
        let table_ref = db.table(table)?;

        let mut names = vec![IDENTITY_COLUMN.to_string()];
        names.extend(table_ref.columns.iter().map(|c| c.name.clone()));
        names.push(CREATED_AT_COLUMN.to_string());
        Ok(names)
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.state.lock().await.table(table)?.rows.len())
    }

    /// Committed rows as JSON objects, in insertion order.
    pub async fn rows(&self, table: &str) -> Result<Vec<Map<String, JsonValue>>> {
        let db = self.state.lock().await;
        let table_ref = db.table(table)?;

        Ok(table_ref
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                object.insert(IDENTITY_COLUMN.to_string(), JsonValue::from(row.id));
                for (column, value) in table_ref.columns.iter().zip(&row.values) {
                    object.insert(column.name.clone(), value.clone());
                }
                object.insert(
                    CREATED_AT_COLUMN.to_string(),
                    JsonValue::String(row.created_at.naive_utc().to_string()),
                );
                object
            })
            .collect())
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<Box<dyn StoreSession>> {
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            transaction: None,
        }))
    }
}

/// A write issued through a session.
#[derive(Clone)]
enum Write {
    CreateTable(TableDefinition),
    Upsert(UpsertStatement),
}

impl Write {
    fn apply(&self, db: &mut Database) -> Result<u64> {
        match self {
            Write::CreateTable(definition) => db.create_table(definition).map(|_| 0),
            Write::Upsert(statement) => db.upsert(statement),
        }
    }
}

/// Open transaction: a working copy for reads and the writes to replay on
/// commit.
struct Transaction {
    db: Database,
    writes: Vec<Write>,
    failed: bool,
}

struct MemorySession {
    state: Arc<Mutex<Database>>,
    transaction: Option<Transaction>,
}

impl MemorySession {
    /// Run one write. Inside a transaction it applies to the working copy
    /// and is logged, and a failure poisons the transaction until rollback.
    /// Outside one it applies atomically to the shared database.
    async fn write(&mut self, write: Write) -> Result<u64> {
        if let Some(tx) = self.transaction.as_mut() {
            if tx.failed {
                return Err(MirrorError::Store(
                    "current transaction is aborted, commands ignored until end of transaction block"
                        .to_string(),
                ));
            }
            return match write.apply(&mut tx.db) {
                Ok(rows) => {
                    tx.writes.push(write);
                    Ok(rows)
                }
                Err(err) => {
                    tx.failed = true;
                    Err(err)
                }
            };
        }

        let mut shared = self.state.lock().await;
        let mut working = shared.clone();
        let rows = write.apply(&mut working)?;
        *shared = working;
        Ok(rows)
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(MirrorError::Store(
                "there is already a transaction in progress".to_string(),
            ));
        }
        let snapshot = self.state.lock().await.clone();
        self.transaction = Some(Transaction {
            db: snapshot,
            writes: Vec::new(),
            failed: false,
        });
        Ok(())
    }

    /// Replays the transaction's writes on the current shared state, so rows
    /// committed by other sessions since `begin` are kept. A write that no
    /// longer applies aborts the commit and nothing is kept.
    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| MirrorError::Store("there is no transaction in progress".to_string()))?;

        if tx.failed {
            return Err(MirrorError::Store(
                "transaction was aborted and has been rolled back".to_string(),
            ));
        }

        let mut shared = self.state.lock().await;
        let mut working = shared.clone();
        for write in &tx.writes {
            write.apply(&mut working).map_err(|err| {
                MirrorError::Store(format!(
                    "could not serialize access due to concurrent update: {}",
                    err
                ))
            })?;
        }
        *shared = working;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.transaction = None;
        Ok(())
    }

    async fn create_table(&mut self, table: &TableDefinition) -> Result<()> {
        self.write(Write::CreateTable(table.clone())).await?;
        Ok(())
    }

    async fn live_columns(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let columns = |db: &Database| -> Vec<LiveColumn> {
            db.tables
                .get(table)
                .map(|t| {
                    t.columns
                        .iter()
                        .map(|c| LiveColumn {
                            name: c.name.clone(),
                            udt_name: c.storage_type.catalog_name().to_string(),
                            unique: c.unique,
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        match &self.transaction {
            Some(tx) if tx.failed => Err(MirrorError::Store(
                "current transaction is aborted, commands ignored until end of transaction block"
                    .to_string(),
            )),
            Some(tx) => Ok(columns(&tx.db)),
            None => Ok(columns(&*self.state.lock().await)),
        }
    }

    async fn execute_upsert(&mut self, statement: &UpsertStatement) -> Result<u64> {
        self.write(Write::Upsert(statement.clone())).await
    }
}

impl Database {
    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .get(name)
            .ok_or_else(|| MirrorError::Store(format!("relation \"{}\" does not exist", name)))
    }

    fn create_table(&mut self, definition: &TableDefinition) -> Result<()> {
        self.extensions.extend(definition.extensions.iter().cloned());

        if self.tables.contains_key(&definition.name) {
            return Ok(());
        }

        let mut columns: Vec<MemoryColumn> = Vec::with_capacity(definition.columns.len());
        for spec in &definition.columns {
            if columns.iter().any(|c| c.name == spec.name) {
                return Err(MirrorError::Store(format!(
                    "column \"{}\" specified more than once",
                    spec.name
                )));
            }
            if let Some(default) = &spec.default {
                let bound =
                    BoundValue::from_json(default, spec.storage_type == StorageType::Document);
                coerce(&bound, spec.storage_type, &spec.name)?;
            }
            columns.push(MemoryColumn {
                name: spec.name.clone(),
                storage_type: spec.storage_type,
                not_null: spec.not_null,
                unique: spec.unique,
                default: spec.default.clone(),
            });
        }

        self.tables.insert(
            definition.name.clone(),
            MemoryTable {
                columns,
                rows: Vec::new(),
                next_id: 1,
            },
        );
        Ok(())
    }

    fn upsert(&mut self, statement: &UpsertStatement) -> Result<u64> {
        let table = self.tables.get_mut(&statement.table).ok_or_else(|| {
            MirrorError::Store(format!("relation \"{}\" does not exist", statement.table))
        })?;

        for column in &statement.columns {
            if table.column_index(&column.name).is_none() {
                return Err(MirrorError::Store(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    column.name, statement.table
                )));
            }
        }

        let row = table.build_row(statement)?;

        let Some(key) = &statement.conflict_key else {
            table.check_unique(&row, None)?;
            table.push_row(row);
            return Ok(1);
        };

        let key_idx = table
            .column_index(key)
            .filter(|idx| table.columns[*idx].unique)
            .ok_or_else(|| {
                MirrorError::Store(
                    "there is no unique or exclusion constraint matching the ON CONFLICT specification"
                        .to_string(),
                )
            })?;

        let existing = match &row[key_idx] {
            JsonValue::Null => None,
            key_value => table
                .rows
                .iter()
                .position(|r| same_value(&r.values[key_idx], key_value)),
        };

        match existing {
            Some(pos) => {
                // DO UPDATE SET touches only the statement's columns
                let mut updated = table.rows[pos].values.clone();
                for column in &statement.columns {
                    if let Some(idx) = table.column_index(&column.name) {
                        updated[idx] = row[idx].clone();
                    }
                }
                table.check_not_null(&updated)?;
                table.check_unique(&updated, Some(pos))?;
                table.rows[pos].values = updated;
            }
            None => {
                table.check_unique(&row, None)?;
                table.push_row(row);
            }
        }

        Ok(1)
    }
}

impl MemoryTable {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Full row: bound values for listed columns, defaults for the rest.
    fn build_row(&self, statement: &UpsertStatement) -> Result<Vec<JsonValue>> {
        let mut row = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let value = match statement.value_of(&column.name) {
                Some(bound) => coerce(bound, column.storage_type, &column.name)?,
                None => match &column.default {
                    Some(default) => coerce(
                        &BoundValue::from_json(default, column.storage_type == StorageType::Document),
                        column.storage_type,
                        &column.name,
                    )?,
                    None => JsonValue::Null,
                },
            };
            row.push(value);
        }

        self.check_not_null(&row)?;
        Ok(row)
    }

    fn check_not_null(&self, row: &[JsonValue]) -> Result<()> {
        for (column, value) in self.columns.iter().zip(row) {
            if column.not_null && value.is_null() {
                return Err(MirrorError::Store(format!(
                    "null value in column \"{}\" violates not-null constraint",
                    column.name
                )));
            }
        }
        Ok(())
    }

    fn check_unique(&self, row: &[JsonValue], ignore: Option<usize>) -> Result<()> {
        for (col_idx, column) in self.columns.iter().enumerate() {
            if !column.unique || row[col_idx].is_null() {
                continue;
            }

            let clash = self
                .rows
                .iter()
                .enumerate()
                .filter(|(pos, _)| Some(*pos) != ignore)
                .any(|(_, existing)| same_value(&existing.values[col_idx], &row[col_idx]));

            if clash {
                return Err(MirrorError::Store(format!(
                    "duplicate key value violates unique constraint on \"{}\": {}",
                    column.name, row[col_idx]
                )));
            }
        }
        Ok(())
    }

    fn push_row(&mut self, values: Vec<JsonValue>) {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(MemoryRow {
            id,
            values,
            created_at: Utc::now(),
        });
    }
}

/// Value equality as the relational engine sees it: numerics compare by
/// value, so `1` and `1.0` are the same key.
fn same_value(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => l == r,
        },
        _ => left == right,
    }
}

/// Cast a text parameter to the column's storage type.
fn coerce(value: &BoundValue, storage_type: StorageType, column: &str) -> Result<JsonValue> {
    let BoundValue::Text(text) = value else {
        return Ok(JsonValue::Null);
    };

    let invalid = |type_name: &str| {
        MirrorError::Store(format!(
            "invalid input syntax for type {}: \"{}\" (column \"{}\")",
            type_name, text, column
        ))
    };

    match storage_type {
        StorageType::Text => Ok(JsonValue::String(text.clone())),
        StorageType::Numeric => text
            .trim()
            .parse::<serde_json::Number>()
            .map(JsonValue::Number)
            .map_err(|_| invalid("numeric")),
        StorageType::Boolean => parse_bool(text)
            .map(JsonValue::Bool)
            .ok_or_else(|| invalid("boolean")),
        StorageType::Timestamp => parse_timestamp(text)
            .map(|ts| JsonValue::String(ts.to_string()))
            .ok_or_else(|| invalid("timestamp")),
        StorageType::Document => {
            serde_json::from_str::<JsonValue>(text).map_err(|_| invalid("json"))
        }
        StorageType::Uuid => uuid::Uuid::parse_str(text.trim())
            .map(|u| JsonValue::String(u.to_string()))
            .map_err(|_| invalid("uuid")),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Timestamps without time zone keep the wall-clock part of an offset input.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
