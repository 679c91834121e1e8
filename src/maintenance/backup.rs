//! Backup providers: dump a store to a file, copy backups around, restore.

use rusqlite::DatabaseName;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use crate::error::{ShelfloadError, ShelfloadResult};

/// External collaborator that knows how to back a store up and restore it
#[allow(async_fn_in_trait)]
pub trait BackupProvider {
    /// Write a full backup of the store to `dest` and return its path
    async fn dump(&self, dest: &Path) -> ShelfloadResult<PathBuf>;

    /// Copy a store or backup file from `source` to `dest`
    async fn copy(&self, source: &Path, dest: &Path) -> ShelfloadResult<()>;

    /// Put the contents of `backup` back into the primary store
    async fn restore(&self, backup: &Path) -> ShelfloadResult<()>;
}

/// SQLite backups through the online backup API
#[derive(Debug, Clone)]
pub struct SqliteFileBackup {
    database: PathBuf,
}

impl SqliteFileBackup {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self { database: database.into() }
    }
}

impl BackupProvider for SqliteFileBackup {
    async fn dump(&self, dest: &Path) -> ShelfloadResult<PathBuf> {
        self.copy(&self.database, dest).await?;
        info!(database = %self.database.display(), backup = %dest.display(), "Database backup successful");
        Ok(dest.to_path_buf())
    }

    async fn copy(&self, source: &Path, dest: &Path) -> ShelfloadResult<()> {
        // Opening a missing file would silently create an empty database
        if !source.exists() {
            return Err(ShelfloadError::backup(format!(
                "database file {} does not exist",
                source.display()
            )));
        }
        ensure_parent(dest)?;

        let conn = rusqlite::Connection::open(source)?;
        conn.backup(DatabaseName::Main, dest, None)?;
        Ok(())
    }

    async fn restore(&self, backup: &Path) -> ShelfloadResult<()> {
        self.copy(backup, &self.database).await?;
        info!(database = %self.database.display(), backup = %backup.display(), "Database restored successfully");
        Ok(())
    }
}

/// PostgreSQL backups through `pg_dump` and `psql`
#[derive(Debug, Clone)]
pub struct PgDumpBackup {
    connection_string: String,
    pg_dump: PathBuf,
    psql: PathBuf,
}

impl PgDumpBackup {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            pg_dump: PathBuf::from("pg_dump"),
            psql: PathBuf::from("psql"),
        }
    }

    /// Use specific client binaries instead of the ones on PATH
    pub fn with_tools(mut self, pg_dump: impl Into<PathBuf>, psql: impl Into<PathBuf>) -> Self {
        self.pg_dump = pg_dump.into();
        self.psql = psql.into();
        self
    }

    async fn run(&self, program: &Path, args: &[&OsStr]) -> ShelfloadResult<()> {
        let output = Command::new(program).args(args).output().await.map_err(|e| {
            ShelfloadError::backup(format!("failed to start {}: {}", program.display(), e))
        })?;

        if !output.status.success() {
            return Err(ShelfloadError::backup(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl BackupProvider for PgDumpBackup {
    async fn dump(&self, dest: &Path) -> ShelfloadResult<PathBuf> {
        ensure_parent(dest)?;
        self.run(
            &self.pg_dump,
            &[
                OsStr::new("--dbname"),
                OsStr::new(&self.connection_string),
                OsStr::new("--file"),
                dest.as_os_str(),
            ],
        )
        .await?;
        info!(backup = %dest.display(), "Database dump written");
        Ok(dest.to_path_buf())
    }

    async fn copy(&self, source: &Path, dest: &Path) -> ShelfloadResult<()> {
        ensure_parent(dest)?;
        tokio::fs::copy(source, dest).await?;
        Ok(())
    }

    async fn restore(&self, backup: &Path) -> ShelfloadResult<()> {
        if !backup.exists() {
            return Err(ShelfloadError::backup(format!("dump file {} does not exist", backup.display())));
        }
        self.run(
            &self.psql,
            &[
                OsStr::new("--dbname"),
                OsStr::new(&self.connection_string),
                OsStr::new("--set"),
                OsStr::new("ON_ERROR_STOP=1"),
                OsStr::new("--file"),
                backup.as_os_str(),
            ],
        )
        .await?;
        info!(backup = %backup.display(), "Database restored from dump");
        Ok(())
    }
}

/// Default backup file name, e.g. `backup_20250101_120000.db`
pub fn default_backup_name(extension: &str) -> PathBuf {
    PathBuf::from(format!(
        "backup_{}.{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        extension
    ))
}

fn ensure_parent(path: &Path) -> ShelfloadResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(path: &Path, value: &str) {
        let conn = rusqlite::Connection::open(path).unwrap();
        conn.execute_batch("CREATE TABLE IF NOT EXISTS t (v TEXT); DELETE FROM t;").unwrap();
        conn.execute("INSERT INTO t (v) VALUES (?1)", [value]).unwrap();
    }

    fn read(path: &Path) -> String {
        let conn = rusqlite::Connection::open(path).unwrap();
        conn.query_row("SELECT v FROM t", [], |row| row.get(0)).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_backup_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("folder").join("litedata.db");
        let backup = dir.path().join("kopie").join("backup_litedata.db");
        std::fs::create_dir_all(primary.parent().unwrap()).unwrap();
        seed(&primary, "original");

        let provider = SqliteFileBackup::new(&primary);
        let written = provider.dump(&backup).await.unwrap();
        assert_eq!(written, backup);
        assert_eq!(read(&backup), "original");

        seed(&primary, "changed");
        provider.restore(&backup).await.unwrap();
        assert_eq!(read(&primary), "original");
    }

    #[tokio::test]
    async fn test_sqlite_dump_of_missing_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteFileBackup::new(dir.path().join("missing.db"));
        let err = provider.dump(&dir.path().join("out.db")).await.unwrap_err();
        assert!(matches!(err, ShelfloadError::Backup { .. }));
        assert!(!dir.path().join("missing.db").exists());
    }

    #[tokio::test]
    async fn test_pg_missing_tool_is_backup_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = PgDumpBackup::new("host=localhost")
            .with_tools(dir.path().join("no-pg_dump"), dir.path().join("no-psql"));
        let err = provider.dump(&dir.path().join("dump.sql")).await.unwrap_err();
        assert!(matches!(err, ShelfloadError::Backup { .. }));
    }

    #[tokio::test]
    async fn test_pg_copy_is_file_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("student04db_backup.sql");
        std::fs::write(&source, "-- dump").unwrap();
        let dest = dir.path().join("archive").join("copy.sql");

        PgDumpBackup::new("host=localhost").copy(&source, &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "-- dump");
    }

    #[test]
    fn test_default_backup_name() {
        let name = default_backup_name("sql");
        let name = name.to_string_lossy();
        assert!(name.starts_with("backup_"));
        assert!(name.ends_with(".sql"));
    }
}
