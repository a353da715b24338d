//! Relational store seam
//!
//! A [`RelationalStore`] hands out [`StoreSession`]s: one connection each,
//! released when the session is dropped. Dropping a session with an open
//! transaction rolls that transaction back.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::core::{LiveColumn, Result};
use crate::loader::UpsertStatement;
use crate::schema::TableDefinition;
use async_trait::async_trait;

#[async_trait]
pub trait RelationalStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Acquire a session (one connection) against the store.
    async fn connect(&self) -> Result<Box<dyn StoreSession>>;
}

#[async_trait]
pub trait StoreSession: Send {
    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Run the definition's prelude and `CREATE TABLE IF NOT EXISTS`.
    async fn create_table(&mut self, table: &TableDefinition) -> Result<()>;

    /// Columns of `table` in ordinal order, synthetic columns excluded.
    /// A missing table yields an empty list.
    async fn live_columns(&mut self, table: &str) -> Result<Vec<LiveColumn>>;

    /// Execute one row write, returning the number of rows affected.
    async fn execute_upsert(&mut self, statement: &UpsertStatement) -> Result<u64>;
}
