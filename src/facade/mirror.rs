use crate::core::{MirrorError, Result};
use crate::loader::{LoaderConfig, UpsertEngine};
use crate::schema::{DdlOptions, TableDefinition, generate_ddl, normalize};
use crate::source::files;
use crate::store::{RelationalStore, StoreSession};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Provisioning and loading against one relational store.
///
/// Every call acquires its own session and releases it before returning,
/// on success and on every error path.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use tablemirror::{Mirror, MemoryStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let mirror = Mirror::new(Arc::new(store.clone()));
///
/// mirror.provision("rockets", &json!({"name": {"type": "String", "unique": true}})).await.unwrap();
/// mirror.load("rockets", &json!([{"name": "Falcon 9"}])).await.unwrap();
///
/// assert_eq!(store.row_count("rockets").await.unwrap(), 1);
/// # });
/// ```
pub struct Mirror {
    store: Arc<dyn RelationalStore>,
    ddl_options: DdlOptions,
    engine: UpsertEngine,
}

impl Mirror {
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self::with_options(store, DdlOptions::default(), LoaderConfig::default())
    }

    pub fn with_options(
        store: Arc<dyn RelationalStore>,
        ddl_options: DdlOptions,
        loader: LoaderConfig,
    ) -> Self {
        Self {
            store,
            ddl_options,
            engine: UpsertEngine::new(loader),
        }
    }

    pub fn store(&self) -> &Arc<dyn RelationalStore> {
        &self.store
    }

    /// Create `table` from a raw schema document unless it already exists.
    pub async fn provision(&self, table: &str, raw_schema: &JsonValue) -> Result<TableDefinition> {
        let schema = normalize(raw_schema)?;
        let definition = generate_ddl(table, &schema, &self.ddl_options)?;

        let mut session = self.store.connect().await?;
        run_in_transaction(session.as_mut(), &definition).await?;

        info!(
            table,
            columns = definition.columns.len(),
            store = self.store.name(),
            "Table provisioned"
        );
        Ok(definition)
    }

    /// Provision from a schema file on disk.
    pub async fn provision_file(
        &self,
        table: &str,
        schema_path: impl AsRef<Path>,
    ) -> Result<TableDefinition> {
        let raw_schema = files::read_json(schema_path)?;
        self.provision(table, &raw_schema).await
    }

    /// Load a record or a list of records into `table`.
    pub async fn load(&self, table: &str, records: &JsonValue) -> Result<u64> {
        let mut session = self.store.connect().await?;
        self.engine.load(session.as_mut(), table, records).await
    }

    /// Load records from a data file on disk.
    pub async fn load_file(&self, table: &str, data_path: impl AsRef<Path>) -> Result<u64> {
        let records = files::read_json(data_path)?;
        self.load(table, &records).await
    }
}

async fn run_in_transaction(session: &mut dyn StoreSession, definition: &TableDefinition) -> Result<()> {
    session.begin().await?;

    if let Err(err) = session.create_table(definition).await {
        if let Err(rollback_err) = session.rollback().await {
            warn!(table = %definition.name, error = %rollback_err, "Rollback after failed DDL also failed");
        }
        return Err(match err {
            MirrorError::Store(message) => {
                MirrorError::Store(format!("creating table '{}': {}", definition.name, message))
            }
            other => other,
        });
    }

    session.commit().await
}
