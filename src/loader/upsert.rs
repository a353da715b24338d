//! Upsert Engine
//!
//! Loads JSON records into a table whose authoritative column set is the
//! store's live catalog. A batch is written inside one transaction: either
//! every record lands or none does.

use super::statement::{BoundValue, UpsertStatement};
use crate::core::{LiveColumn, MirrorError, Result};
use crate::store::StoreSession;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Natural identity columns, most preferred first.
    pub conflict_keys: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            conflict_keys: ["serial_number", "serialNumber", "serial", "name"]
                .iter()
                .map(|key| key.to_string())
                .collect(),
        }
    }
}

impl LoaderConfig {
    pub fn with_conflict_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conflict_keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct UpsertEngine {
    config: LoaderConfig,
}

impl UpsertEngine {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a record or a list of records into `table`, returning the number
    /// of rows affected.
    pub async fn load(
        &self,
        session: &mut dyn StoreSession,
        table: &str,
        records: &JsonValue,
    ) -> Result<u64> {
        let batch = normalize_records(records)?;

        let columns = session.live_columns(table).await?;
        if columns.is_empty() {
            return Err(MirrorError::NoColumns(table.to_string()));
        }

        let conflict_key = self.conflict_key(table, &columns);
        debug!(
            table,
            columns = columns.len(),
            conflict_key = conflict_key.as_deref().unwrap_or("<none>"),
            "Resolved load target"
        );

        let statements: Vec<UpsertStatement> = batch
            .iter()
            .map(|record| build_statement(table, &columns, record, conflict_key.clone()))
            .collect();

        session.begin().await?;

        let mut affected = 0u64;
        for (index, statement) in statements.iter().enumerate() {
            match session.execute_upsert(statement).await {
                Ok(rows) => affected += rows,
                Err(err) => {
                    if let Err(rollback_err) = session.rollback().await {
                        warn!(table, error = %rollback_err, "Rollback after failed record also failed");
                    }
                    let detail = match err {
                        MirrorError::Store(message) => message,
                        other => other.to_string(),
                    };
                    return Err(MirrorError::Store(format!(
                        "record {} of {} in '{}': {}",
                        index,
                        statements.len(),
                        table,
                        detail
                    )));
                }
            }
        }

        session.commit().await?;

        info!(table, records = statements.len(), rows = affected, "Loaded records");
        Ok(affected)
    }

    /// Pick the natural identity column used to resolve conflicts.
    ///
    /// The first preferred name present in the live catalog with a unique
    /// constraint wins. A preferred column without one cannot be an
    /// `ON CONFLICT` target and is passed over.
    pub fn conflict_key(&self, table: &str, columns: &[LiveColumn]) -> Option<String> {
        for candidate in &self.config.conflict_keys {
            let Some(column) = columns.iter().find(|c| &c.name == candidate) else {
                continue;
            };

            if column.unique {
                return Some(column.name.clone());
            }

            warn!(
                table,
                column = %column.name,
                "Conflict key candidate has no unique constraint; skipping it"
            );
        }

        None
    }
}

impl Default for UpsertEngine {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

/// A single object becomes a one-record batch; a list must hold only objects.
pub fn normalize_records(records: &JsonValue) -> Result<Vec<&serde_json::Map<String, JsonValue>>> {
    match records {
        JsonValue::Object(record) => Ok(vec![record]),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_object().ok_or_else(|| {
                    MirrorError::RecordShape(format!(
                        "element {} of the batch is not an object",
                        index
                    ))
                })
            })
            .collect(),
        other => Err(MirrorError::RecordShape(format!(
            "expected an object or a list of objects, got {}",
            other
        ))),
    }
}

fn build_statement(
    table: &str,
    columns: &[LiveColumn],
    record: &serde_json::Map<String, JsonValue>,
    conflict_key: Option<String>,
) -> UpsertStatement {
    let values = columns
        .iter()
        .map(|column| {
            record
                .get(&column.name)
                .map(|value| BoundValue::from_json(value, column.is_document()))
                .unwrap_or(BoundValue::Null)
        })
        .collect();

    UpsertStatement::new(table, columns.to_vec(), values).on_conflict(conflict_key)
}
