//! Store configuration passed explicitly into connect, import and backup calls.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ShelfloadError, ShelfloadResult};

/// Kind of destination store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Sqlite,
}

impl StoreKind {
    /// Positional placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            StoreKind::Postgres => format!("${}", index),
            StoreKind::Sqlite => format!("?{}", index),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Postgres => write!(f, "PostgreSQL"),
            StoreKind::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Where connection credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Everything needed is already in `StoreConfig::database`
    Inline,
    /// JSON credentials file with host_name, user_name, db_name, password, port_number
    File(PathBuf),
}

/// Connection settings for one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Database file path for SQLite, connection string for PostgreSQL
    pub database: String,
    pub credentials: Credentials,
}

impl StoreConfig {
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            kind: StoreKind::Sqlite,
            database: path.as_ref().to_string_lossy().into_owned(),
            credentials: Credentials::Inline,
        }
    }

    pub fn postgres(dsn: impl Into<String>) -> Self {
        Self {
            kind: StoreKind::Postgres,
            database: dsn.into(),
            credentials: Credentials::Inline,
        }
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials = Credentials::File(path.into());
        self
    }

    /// Path of the database file (SQLite only)
    pub fn database_path(&self) -> ShelfloadResult<PathBuf> {
        match self.kind {
            StoreKind::Sqlite if !self.database.is_empty() => Ok(PathBuf::from(&self.database)),
            StoreKind::Sqlite => Err(ShelfloadError::configuration("SQLite store needs a database path")),
            StoreKind::Postgres => Err(ShelfloadError::configuration(
                "PostgreSQL stores have no database file",
            )),
        }
    }

    /// Connection string understood by both tokio-postgres and libpq tools.
    ///
    /// A credentials file takes precedence over an inline DSN.
    pub fn connection_string(&self) -> ShelfloadResult<String> {
        if self.kind != StoreKind::Postgres {
            return Err(ShelfloadError::configuration(
                "connection strings only apply to PostgreSQL stores",
            ));
        }

        match &self.credentials {
            Credentials::File(path) => Ok(CredentialsFile::load(path)?.to_connection_string()),
            Credentials::Inline if self.database.is_empty() => Err(ShelfloadError::configuration(
                "PostgreSQL store needs a connection string or a credentials file",
            )),
            Credentials::Inline => Ok(self.database.clone()),
        }
    }
}

/// On-disk credentials format
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsFile {
    pub host_name: String,
    pub user_name: String,
    pub db_name: String,
    pub password: String,
    pub port_number: PortNumber,
}

/// Port given either as a JSON number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortNumber {
    Number(u16),
    Text(String),
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortNumber::Number(n) => write!(f, "{}", n),
            PortNumber::Text(s) => write!(f, "{}", s),
        }
    }
}

impl CredentialsFile {
    pub fn load(path: &Path) -> ShelfloadResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ShelfloadError::configuration(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_connection_string(&self) -> String {
        format!(
            "host={} user={} dbname={} password={} port={}",
            quote_conninfo(&self.host_name),
            quote_conninfo(&self.user_name),
            quote_conninfo(&self.db_name),
            quote_conninfo(&self.password),
            quote_conninfo(&self.port_number.to_string()),
        )
    }
}

/// Quote a key/value connection string value when it needs it
fn quote_conninfo(value: &str) -> String {
    if !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\') {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
