// ============================================================================
// TableMirror Library
// ============================================================================

pub mod config;
pub mod connection;
pub mod core;
pub mod facade;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use config::MirrorConfig;
pub use connection::StoreConfig;
pub use core::{
    DeclaredType, FieldDescriptor, LiveColumn, MirrorError, Result, SchemaDocument, StorageType,
    StructuralHint,
};
pub use facade::Mirror;
pub use loader::{LoaderConfig, UpsertEngine};
pub use schema::{DdlOptions, TableDefinition, generate_ddl, map_type, normalize};
pub use store::{MemoryStore, PostgresStore, RelationalStore, StoreSession};
