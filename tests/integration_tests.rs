use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use shelfload::config::StoreConfig;
use shelfload::data_importer::{run_import, CommitMode, Dataset, ImportJob, ImportOptions};
use shelfload::error::ShelfloadError;
use shelfload::maintenance::{drop_tables, setup_schema, BackupProvider, SqliteFileBackup};
use shelfload::store::{Connection, SqliteStore, Store};

const USERS_CSV: &str = "imię;nazwisko;adres zamieszkania;PESEL;adres mail;liczba wypożyczonych książek
Anna;Nowak;Lodz;12345678901;a@x.pl;2
Jan;Kowalski;Krakow;12345678902;j@x.pl;0
";

const BOOKS_CSV: &str = "nazwa ksiązki;autor;indeks;przez kogo wypożyczona;czas wypożyczenia
Solaris;Stanisław Lem;9788308049;12345678901;14
Lalka;Bolesław Prus;9788307033;;0
";

/// Scratch directory holding a SQLite database with the schema in place
struct TestLibrary {
    dir: TempDir,
    config: StoreConfig,
}

impl TestLibrary {
    async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = StoreConfig::sqlite(dir.path().join("folder").join("litedata.db"));

        let mut store = Connection::open(&config).await?;
        setup_schema(&mut store).await?;
        store.close().await?;

        Ok(Self { dir, config })
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    fn db_path(&self) -> PathBuf {
        self.config.database_path().unwrap()
    }

    fn open(&self) -> SqliteStore {
        SqliteStore::open(self.db_path()).unwrap()
    }

    fn count(&self, table: &str) -> i64 {
        self.open()
            .connection()
            .query_row(&format!("SELECT count(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }
}

fn json_library(users_key: &str, books_key: &str) -> String {
    format!(
        r#"{{
            "{users_key}": [
                {{"imię": "Anna", "nazwisko": "Nowak", "adres zamieszkania": "Lodz", "PESEL": "12345678901",
                  "adres mail": "a@x.pl", "liczba wypożyczonych książek": "2"}}
            ],
            "{books_key}": [
                {{"nazwa ksiązki": "Lalka", "autor": "Bolesław Prus", "indeks": "9788307033",
                  "przez kogo wypożyczona": "", "czas wypożyczenia": 0}}
            ]
        }}"#
    )
}

#[tokio::test]
async fn test_users_csv_import_stores_integer_count() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let source = lib.write("Użytkownicy.csv", USERS_CSV)?;

    let result = run_import(&lib.config, &ImportJob::new(Dataset::Users, &source)).await?;
    assert_eq!(result.imported_records, 2);
    assert!(result.is_successful());

    let store = lib.open();
    let (rented, kind): (i64, String) = store.connection().query_row(
        "SELECT rented_count, typeof(rented_count) FROM people WHERE national_id = '12345678901'",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    assert_eq!(rented, 2);
    assert_eq!(kind, "integer");
    Ok(())
}

#[tokio::test]
async fn test_books_csv_blank_borrower_is_null() -> Result<()> {
    let lib = TestLibrary::new().await?;
    run_import(&lib.config, &ImportJob::new(Dataset::Users, lib.write("u.csv", USERS_CSV)?)).await?;

    let result = run_import(&lib.config, &ImportJob::new(Dataset::Books, lib.write("b.csv", BOOKS_CSV)?)).await?;
    assert_eq!(result.imported_records, 2);

    let borrower: Option<String> = lib.open().connection().query_row(
        "SELECT borrower_id FROM items WHERE catalog_index = '9788307033'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(borrower, None);
    Ok(())
}

#[tokio::test]
async fn test_json_dataset_found_ignoring_case() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let source = lib.write("dane.json", &json_library("Users", "Books"))?;

    let users = run_import(&lib.config, &ImportJob::new(Dataset::Users, &source)).await?;
    let books = run_import(&lib.config, &ImportJob::new(Dataset::Books, &source)).await?;

    assert_eq!(users.imported_records, 1);
    assert_eq!(books.imported_records, 1);
    assert_eq!(lib.count("items"), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_dataset_key_is_fatal() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let source = lib.write("dane.json", &json_library("users", "books"))?;

    let mut job = ImportJob::new(Dataset::Books, &source);
    job.key = Some("magazines".to_string());

    let err = run_import(&lib.config, &job).await.unwrap_err();
    assert!(matches!(err, ShelfloadError::KeyNotFound { ref key } if key == "magazines"));
    assert_eq!(lib.count("items"), 0);
    assert_eq!(lib.count("people"), 0);
    Ok(())
}

#[tokio::test]
async fn test_second_run_fails_per_duplicate() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let source = lib.write("u.csv", USERS_CSV)?;

    for mode in [CommitMode::Batch, CommitMode::PerRecord] {
        let mut job = ImportJob::new(Dataset::Users, &source);
        job.options = ImportOptions { commit_mode: mode };

        let result = run_import(&lib.config, &job).await?;
        if mode == CommitMode::Batch {
            assert_eq!(result.imported_records, 2);
        } else {
            assert_eq!(result.imported_records, 0);
            assert_eq!(result.failed_records(), 2);
        }
    }
    assert_eq!(lib.count("people"), 2);
    Ok(())
}

#[tokio::test]
async fn test_partial_failure_keeps_good_rows() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let csv = "imię;nazwisko;adres zamieszkania;PESEL;adres mail;liczba wypożyczonych książek
Anna;Nowak;Lodz;12345678901;a@x.pl;2
Jan;Kowalski;Krakow;12345678902;j@x.pl;sporo
Ewa;Lis;Gdansk;12345678903;e@x.pl;3
";
    let result = run_import(&lib.config, &ImportJob::new(Dataset::Users, lib.write("u.csv", csv)?)).await?;

    assert_eq!(result.imported_records, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 1);
    assert_eq!(lib.count("people"), 2);
    Ok(())
}

#[tokio::test]
async fn test_ragged_csv_row_does_not_abort_import() -> Result<()> {
    let lib = TestLibrary::new().await?;
    let csv = "imię;nazwisko;adres zamieszkania;PESEL;adres mail;liczba wypożyczonych książek
Anna;Nowak;Lodz;12345678901;a@x.pl;2
Jan;Kowalski;Krakow;12345678902;j@x.pl
Ewa;Lis;Gdansk;12345678903;e@x.pl;3
";
    let result = run_import(&lib.config, &ImportJob::new(Dataset::Users, lib.write("u.csv", csv)?)).await?;

    assert_eq!(result.imported_records, 2);
    assert_eq!(result.failed_records(), 1);
    assert_eq!(result.failures[0].index, 1);
    assert_eq!(lib.count("people"), 2);
    Ok(())
}

#[tokio::test]
async fn test_backup_drop_restore_cycle() -> Result<()> {
    let lib = TestLibrary::new().await?;
    run_import(&lib.config, &ImportJob::new(Dataset::Users, lib.write("u.csv", USERS_CSV)?)).await?;

    let backup_path = lib.dir.path().join("kopie").join("baza_backup.db");
    let provider = SqliteFileBackup::new(lib.db_path());
    provider.dump(&backup_path).await?;

    let mut store = Connection::open(&lib.config).await?;
    drop_tables(&mut store, &["items", "people"]).await?;
    store.close().await?;

    provider.restore(&backup_path).await?;
    assert_eq!(lib.count("people"), 2);
    Ok(())
}

/// Runs only when TEST_DATABASE_URL points at a disposable PostgreSQL database
fn postgres_config() -> Option<StoreConfig> {
    std::env::var("TEST_DATABASE_URL").ok().map(StoreConfig::postgres)
}

#[tokio::test]
async fn test_postgres_end_to_end() -> Result<()> {
    let Some(config) = postgres_config() else {
        eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
        return Ok(());
    };

    let dir = tempfile::tempdir()?;
    let users = write_to(dir.path(), "u.csv", USERS_CSV)?;
    let books = write_to(dir.path(), "b.csv", BOOKS_CSV)?;

    let mut store = Connection::open(&config).await?;
    drop_tables(&mut store, &["items", "people"]).await?;
    setup_schema(&mut store).await?;
    store.close().await?;

    let first = run_import(&config, &ImportJob::new(Dataset::Users, &users)).await?;
    assert_eq!(first.imported_records, 2);

    let second = run_import(&config, &ImportJob::new(Dataset::Users, &users)).await?;
    assert_eq!(second.failed_records(), 2);

    let result = run_import(&config, &ImportJob::new(Dataset::Books, &books)).await?;
    assert_eq!(result.imported_records, 2);

    let mut store = Connection::open(&config).await?;
    drop_tables(&mut store, &["items", "people"]).await?;
    store.close().await?;
    Ok(())
}

fn write_to(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}
