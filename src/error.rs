use thiserror::Error;

/// Batch-fatal error type for the Shelfload system
#[derive(Error, Debug)]
pub enum ShelfloadError {
    #[error("Malformed source: {message}")]
    MalformedSource { message: String },

    #[error("Key '{key}' not found in source document")]
    KeyNotFound { key: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Backup error: {message}")]
    Backup { message: String },

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShelfloadError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSource { message: message.into() }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store { message: message.into() }
    }

    pub fn backup(message: impl Into<String>) -> Self {
        Self::Backup { message: message.into() }
    }
}

/// Record-level error: isolated to one record, never aborts a batch
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' is not an integer: {value:?}")]
    InvalidInteger { field: String, value: String },

    #[error("store rejected record: {0}")]
    Store(ShelfloadError),
}

pub type ShelfloadResult<T> = Result<T, ShelfloadError>;
