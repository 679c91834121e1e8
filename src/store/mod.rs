//! Store abstraction over one open PostgreSQL or SQLite connection.
//!
//! Every operation runs on the caller's task and completes before it
//! returns; a store is never shared between importers.

mod postgres;
mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

use tracing::{info, warn};

use crate::config::{StoreConfig, StoreKind};
use crate::error::ShelfloadResult;
use crate::types::FieldValue;

/// Operations the importer and the maintenance helpers need from a store
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Handle for a statement prepared once and executed many times
    type Statement;

    fn kind(&self) -> StoreKind;

    /// Prepare a statement. Unknown tables and columns fail here.
    async fn prepare(&mut self, sql: &str) -> ShelfloadResult<Self::Statement>;

    /// Execute a prepared statement with positional parameters
    async fn execute(&mut self, statement: &Self::Statement, params: &[FieldValue]) -> ShelfloadResult<u64>;

    /// Run one or more parameterless statements
    async fn execute_batch(&mut self, sql: &str) -> ShelfloadResult<()>;

    async fn close(self) -> ShelfloadResult<()>
    where
        Self: Sized;

    async fn begin(&mut self) -> ShelfloadResult<()> {
        self.execute_batch("BEGIN").await
    }

    async fn commit(&mut self) -> ShelfloadResult<()> {
        self.execute_batch("COMMIT").await
    }

    async fn rollback(&mut self) -> ShelfloadResult<()> {
        self.execute_batch("ROLLBACK").await
    }

    async fn savepoint(&mut self, name: &str) -> ShelfloadResult<()> {
        self.execute_batch(&format!("SAVEPOINT {}", name)).await
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> ShelfloadResult<()> {
        self.execute_batch(&format!("ROLLBACK TO SAVEPOINT {}", name)).await
    }

    async fn release_savepoint(&mut self, name: &str) -> ShelfloadResult<()> {
        self.execute_batch(&format!("RELEASE SAVEPOINT {}", name)).await
    }
}

/// Close `store` once the work that produced `outcome` is done.
///
/// An error already in `outcome` wins over a failure to close.
pub async fn close_after<S: Store, T>(store: S, outcome: ShelfloadResult<T>) -> ShelfloadResult<T> {
    match store.close().await {
        Ok(()) => outcome,
        Err(close_err) if outcome.is_ok() => Err(close_err),
        Err(close_err) => {
            warn!(error = %close_err, "Failed to close store after an earlier error");
            outcome
        }
    }
}

/// Connection to whichever store the configuration names
pub enum Connection {
    Postgres(PgStore),
    Sqlite(SqliteStore),
}

/// Prepared statement of a `Connection`
pub enum ConnectionStatement {
    Postgres(<PgStore as Store>::Statement),
    Sqlite(<SqliteStore as Store>::Statement),
}

impl Connection {
    /// Open the store described by `config`
    pub async fn open(config: &StoreConfig) -> ShelfloadResult<Self> {
        info!(kind = %config.kind, "Opening store connection");
        match config.kind {
            StoreKind::Postgres => {
                let conn_str = config.connection_string()?;
                Ok(Connection::Postgres(PgStore::connect(&conn_str).await?))
            }
            StoreKind::Sqlite => {
                let path = config.database_path()?;
                Ok(Connection::Sqlite(SqliteStore::open(&path)?))
            }
        }
    }
}

impl Store for Connection {
    type Statement = ConnectionStatement;

    fn kind(&self) -> StoreKind {
        match self {
            Connection::Postgres(store) => store.kind(),
            Connection::Sqlite(store) => store.kind(),
        }
    }

    async fn prepare(&mut self, sql: &str) -> ShelfloadResult<Self::Statement> {
        match self {
            Connection::Postgres(store) => Ok(ConnectionStatement::Postgres(store.prepare(sql).await?)),
            Connection::Sqlite(store) => Ok(ConnectionStatement::Sqlite(store.prepare(sql).await?)),
        }
    }

    async fn execute(&mut self, statement: &Self::Statement, params: &[FieldValue]) -> ShelfloadResult<u64> {
        match (self, statement) {
            (Connection::Postgres(store), ConnectionStatement::Postgres(stmt)) => store.execute(stmt, params).await,
            (Connection::Sqlite(store), ConnectionStatement::Sqlite(stmt)) => store.execute(stmt, params).await,
            _ => Err(crate::error::ShelfloadError::store(
                "statement was prepared on a different kind of store",
            )),
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> ShelfloadResult<()> {
        match self {
            Connection::Postgres(store) => store.execute_batch(sql).await,
            Connection::Sqlite(store) => store.execute_batch(sql).await,
        }
    }

    async fn close(self) -> ShelfloadResult<()> {
        match self {
            Connection::Postgres(store) => store.close().await,
            Connection::Sqlite(store) => store.close().await,
        }
    }
}
