//! Schema-driven table provisioning
//!
//! - `normalizer.rs` - loosely-structured schema JSON to [`SchemaDocument`]
//! - `type_mapper.rs` - declared types to storage types
//! - `ddl.rs` - table definitions and `CREATE TABLE IF NOT EXISTS`
//!
//! [`SchemaDocument`]: crate::core::SchemaDocument

mod ddl;
mod normalizer;
mod type_mapper;

pub use ddl::{ColumnSpec, DdlOptions, TableDefinition, generate_ddl};
pub use normalizer::{normalize, normalize_str};
pub use type_mapper::{declared_type_of, map_json_type, map_type, map_type_name};
