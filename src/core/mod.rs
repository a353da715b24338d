pub mod error;
pub mod types;

pub use error::{MirrorError, Result};
pub use types::{
    CREATED_AT_COLUMN, DeclaredType, FieldDescriptor, IDENTITY_COLUMN, LiveColumn, SchemaDocument,
    StorageType, StructuralHint, is_synthetic_column, quote_ident, quote_literal,
};
