// Schema setup, table drops, backup and restore
pub mod backup;
pub mod schema;

pub use backup::{default_backup_name, BackupProvider, PgDumpBackup, SqliteFileBackup};
pub use schema::{drop_tables, schema_ddl, setup_schema};
