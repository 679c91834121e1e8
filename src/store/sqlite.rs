//! SQLite store backed by a single rusqlite connection

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{params_from_iter, ToSql};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Store;
use crate::config::StoreKind;
use crate::error::{ShelfloadError, ShelfloadResult};
use crate::types::FieldValue;

pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: rusqlite::Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> ShelfloadResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = rusqlite::Connection::open(&path)?;
        debug!(path = %path.display(), "Opened SQLite database");
        Self::init(Some(path), conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> ShelfloadResult<Self> {
        Self::init(None, rusqlite::Connection::open_in_memory()?)
    }

    fn init(path: Option<PathBuf>, conn: rusqlite::Connection) -> ShelfloadResult<Self> {
        // Foreign keys are off by default in SQLite
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Direct access for queries outside the `Store` surface
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
            FieldValue::Integer(v) => ToSqlOutput::from(*v),
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl Store for SqliteStore {
    /// SQL text; rusqlite keeps the compiled statement in its cache
    type Statement = String;

    fn kind(&self) -> StoreKind {
        StoreKind::Sqlite
    }

    async fn prepare(&mut self, sql: &str) -> ShelfloadResult<String> {
        self.conn.prepare_cached(sql)?;
        Ok(sql.to_string())
    }

    async fn execute(&mut self, statement: &String, params: &[FieldValue]) -> ShelfloadResult<u64> {
        let mut stmt = self.conn.prepare_cached(statement)?;
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        Ok(changed as u64)
    }

    async fn execute_batch(&mut self, sql: &str) -> ShelfloadResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    async fn close(self) -> ShelfloadResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ShelfloadError::store(format!("failed to close SQLite database: {}", e)))
    }
}
