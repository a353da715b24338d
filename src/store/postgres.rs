use super::{RelationalStore, StoreSession};
use crate::connection::StoreConfig;
use crate::core::{CREATED_AT_COLUMN, IDENTITY_COLUMN, LiveColumn, Result, quote_literal};
use crate::loader::UpsertStatement;
use crate::schema::TableDefinition;
use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

/// PostgreSQL backend over `tokio-postgres`.
pub struct PostgresStore {
    config: StoreConfig,
}

impl PostgresStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl RelationalStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&self) -> Result<Box<dyn StoreSession>> {
        let (client, connection) = self.config.to_pg_config().connect(NoTls).await?;

        // The connection future drives the socket; it finishes once the
        // client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "Postgres connection error");
            }
        });

        debug!(url = %self.config.to_url(), "Connected to store");
        Ok(Box::new(PostgresSession { client }))
    }
}

struct PostgresSession {
    client: Client,
}

fn live_columns_sql() -> String {
    format!(
        "SELECT a.attname::text, t.typname::text, \
                EXISTS ( \
                    SELECT 1 FROM pg_index i \
                    WHERE i.indrelid = a.attrelid \
                      AND i.indisunique \
                      AND i.indnatts = 1 \
                      AND i.indpred IS NULL \
                      AND i.indkey[0] = a.attnum \
                ) \
         FROM pg_attribute a \
         JOIN pg_class c ON c.oid = a.attrelid \
         JOIN pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_type t ON t.oid = a.atttypid \
         WHERE c.relname = $1 \
           AND n.nspname = current_schema() \
           AND a.attnum > 0 \
           AND NOT a.attisdropped \
           AND a.attname NOT IN ({}, {}) \
         ORDER BY a.attnum",
        quote_literal(IDENTITY_COLUMN),
        quote_literal(CREATED_AT_COLUMN)
    )
}

#[async_trait]
impl StoreSession for PostgresSession {
    async fn begin(&mut self) -> Result<()> {
        self.client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn create_table(&mut self, table: &TableDefinition) -> Result<()> {
        for statement in table.statements() {
            debug!(sql = %statement, "Executing DDL");
            self.client.batch_execute(&statement).await?;
        }
        Ok(())
    }

    async fn live_columns(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let rows = self.client.query(live_columns_sql().as_str(), &[&table]).await?;

        Ok(rows
            .iter()
            .map(|row| LiveColumn {
                name: row.get(0),
                udt_name: row.get(1),
                unique: row.get(2),
            })
            .collect())
    }

    async fn execute_upsert(&mut self, statement: &UpsertStatement) -> Result<u64> {
        let sql = statement.to_sql();
        let params: Vec<Option<&str>> = statement.values.iter().map(|v| v.as_param()).collect();
        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let rows = self.client.execute(sql.as_str(), &refs).await?;
        Ok(rows)
    }
}
