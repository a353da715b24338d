use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Schema shape error: {0}")]
    SchemaShape(String),

    #[error("Schema for table '{0}' produced no columns")]
    EmptyColumnSet(String),

    #[error("Table '{0}' has no usable columns in the live catalog")]
    NoColumns(String),

    #[error("Record shape error: {0}")]
    RecordShape(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MirrorError>;

impl MirrorError {
    /// True for errors raised by the relational engine itself.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<tokio_postgres::Error> for MirrorError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Surface the server-side message when there is one; the Display of
        // tokio_postgres::Error alone is just "db error".
        match err.as_db_error() {
            Some(db) => Self::Store(format!("{}: {}", db.code().code(), db.message())),
            None => Self::Store(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for MirrorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Source(err.to_string())
    }
}

impl From<tempfile::PersistError> for MirrorError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
