use tracing::info;

use crate::config::StoreKind;
use crate::data_importer::sql_generator::utils::escape_identifier;
use crate::error::ShelfloadResult;
use crate::store::Store;

const POSTGRES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS people (
    name VARCHAR(40),
    surname VARCHAR(40),
    address VARCHAR(40),
    national_id CHAR(11) PRIMARY KEY,
    email VARCHAR(40),
    rented_count SMALLINT CHECK (rented_count BETWEEN 0 AND 15)
);
CREATE TABLE IF NOT EXISTS items (
    title VARCHAR(40),
    author VARCHAR(40),
    catalog_index CHAR(13) PRIMARY KEY,
    borrower_id CHAR(11),
    loan_duration SMALLINT CHECK (loan_duration BETWEEN 0 AND 60),
    FOREIGN KEY (borrower_id) REFERENCES people(national_id) ON DELETE SET NULL
);
";

const SQLITE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS people (
    name TEXT,
    surname TEXT,
    address TEXT,
    national_id TEXT NOT NULL PRIMARY KEY CHECK (length(national_id) = 11),
    email TEXT,
    rented_count INTEGER CHECK (rented_count BETWEEN 0 AND 15)
);
CREATE TABLE IF NOT EXISTS items (
    title TEXT,
    author TEXT,
    catalog_index TEXT NOT NULL PRIMARY KEY CHECK (length(catalog_index) <= 13),
    borrower_id TEXT,
    loan_duration INTEGER CHECK (loan_duration BETWEEN 0 AND 60),
    FOREIGN KEY (borrower_id) REFERENCES people(national_id) ON DELETE SET NULL
);
";

/// DDL for the people/items schema in the store's dialect
pub fn schema_ddl(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::Postgres => POSTGRES_SCHEMA,
        StoreKind::Sqlite => SQLITE_SCHEMA,
    }
}

/// Create the people and items tables if they do not exist yet
pub async fn setup_schema<S: Store>(store: &mut S) -> ShelfloadResult<()> {
    store.execute_batch(schema_ddl(store.kind())).await?;
    info!(kind = %store.kind(), "Schema ready");
    Ok(())
}

/// Drop each named table if it exists, in the given order.
///
/// Referencing tables must come before the tables they reference.
pub async fn drop_tables<S: Store>(store: &mut S, tables: &[&str]) -> ShelfloadResult<()> {
    for table in tables {
        store
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", escape_identifier(table)))
            .await?;
        info!(table = *table, "Dropped table if it existed");
    }
    Ok(())
}
