//! Record loading
//!
//! - `statement.rs` - bound values and the `INSERT ... ON CONFLICT` statement
//! - `upsert.rs` - batch loading against the live column catalog

mod statement;
mod upsert;

pub use statement::{BoundValue, UpsertStatement};
pub use upsert::{LoaderConfig, UpsertEngine, normalize_records};
