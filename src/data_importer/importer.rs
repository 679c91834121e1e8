use tracing::{debug, info, warn};

use crate::data_importer::coercion::extract_row;
use crate::data_importer::sql_generator::InsertStatement;
use crate::error::{RecordError, ShelfloadError};
use crate::store::Store;
use crate::types::{FieldMap, Record, RecordBatch};

const RECORD_SAVEPOINT: &str = "shelfload_record";

/// When successful inserts become durable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// One transaction for the whole batch, one savepoint per record
    #[default]
    Batch,
    /// Every successful insert commits on its own
    PerRecord,
}

/// Options for an import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub commit_mode: CommitMode,
}

/// A record that could not be imported
#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record in its batch
    pub index: usize,
    pub error: RecordError,
}

/// Outcome of one import run
#[derive(Debug)]
pub struct ImportResult {
    pub table_name: String,
    pub total_records: usize,
    pub imported_records: usize,
    pub failures: Vec<RecordFailure>,
}

impl ImportResult {
    fn new(table_name: &str, total_records: usize) -> Self {
        Self {
            table_name: table_name.to_string(),
            total_records,
            imported_records: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed_records(&self) -> usize {
        self.failures.len()
    }

    pub fn is_successful(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} of {} records imported, {} failed",
            self.table_name,
            self.imported_records,
            self.total_records,
            self.failures.len()
        )
    }
}

/// Outcome of a single record attempt
enum Attempt {
    Inserted,
    Rejected(RecordError),
}

/// Inserts record batches row by row, isolating per-record failures
#[derive(Debug, Clone, Default)]
pub struct RecordImporter {
    options: ImportOptions,
}

impl RecordImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ImportOptions) -> Self {
        Self { options }
    }

    /// Insert every record of `records` into `table_name`.
    ///
    /// Record-level problems (missing fields, bad integers, constraint
    /// violations) are collected in the result. Errors returned from here
    /// are batch-fatal: the insert could not be prepared, or the
    /// transaction could not be started, finished or repaired.
    pub async fn import_records<S: Store>(
        &self,
        store: &mut S,
        table_name: &str,
        records: &RecordBatch,
        field_map: &FieldMap,
    ) -> Result<ImportResult, ShelfloadError> {
        let insert = InsertStatement::build(store.kind(), table_name, field_map);
        debug!(sql = %insert.sql, "Prepared insert statement");
        let statement = store.prepare(&insert.sql).await?;

        let mut result = ImportResult::new(table_name, records.len());
        if records.is_empty() {
            info!(table = table_name, "No records to import");
            return Ok(result);
        }

        let batched = self.options.commit_mode == CommitMode::Batch;
        if batched {
            store.begin().await?;
        }

        for (index, record) in records.iter().enumerate() {
            let attempt = if batched {
                self.attempt_in_savepoint(store, &statement, record, field_map).await
            } else {
                Ok(self.attempt(store, &statement, record, field_map).await)
            };

            match attempt {
                Ok(Attempt::Inserted) => result.imported_records += 1,
                Ok(Attempt::Rejected(error)) => {
                    warn!(table = table_name, index, error = %error, "Record rejected");
                    result.failures.push(RecordFailure { index, error });
                }
                Err(fatal) => {
                    if batched {
                        if let Err(e) = store.rollback().await {
                            warn!(error = %e, "Rollback after fatal import error failed");
                        }
                    }
                    return Err(fatal);
                }
            }
        }

        if batched {
            if let Err(e) = store.commit().await {
                if let Err(rollback_err) = store.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed commit failed");
                }
                return Err(e);
            }
        }

        info!(
            table = table_name,
            imported = result.imported_records,
            failed = result.failed_records(),
            "Import finished"
        );
        Ok(result)
    }

    async fn attempt<S: Store>(
        &self,
        store: &mut S,
        statement: &S::Statement,
        record: &Record,
        field_map: &FieldMap,
    ) -> Attempt {
        let values = match extract_row(record, field_map) {
            Ok(values) => values,
            Err(e) => return Attempt::Rejected(e),
        };

        match store.execute(statement, &values).await {
            Ok(_) => Attempt::Inserted,
            Err(e) => Attempt::Rejected(RecordError::Store(e)),
        }
    }

    /// Like `attempt`, but a rejected insert is rolled back to a savepoint so
    /// the surrounding transaction stays usable
    async fn attempt_in_savepoint<S: Store>(
        &self,
        store: &mut S,
        statement: &S::Statement,
        record: &Record,
        field_map: &FieldMap,
    ) -> Result<Attempt, ShelfloadError> {
        let values = match extract_row(record, field_map) {
            Ok(values) => values,
            Err(e) => return Ok(Attempt::Rejected(e)),
        };

        store.savepoint(RECORD_SAVEPOINT).await?;
        let attempt = match store.execute(statement, &values).await {
            Ok(_) => Attempt::Inserted,
            Err(e) => {
                store.rollback_to_savepoint(RECORD_SAVEPOINT).await?;
                Attempt::Rejected(RecordError::Store(e))
            }
        };
        store.release_savepoint(RECORD_SAVEPOINT).await?;

        Ok(attempt)
    }
}

/// Import with default options (batched commit)
pub async fn import_records<S: Store>(
    store: &mut S,
    table_name: &str,
    records: &RecordBatch,
    field_map: &FieldMap,
) -> Result<ImportResult, ShelfloadError> {
    RecordImporter::new()
        .import_records(store, table_name, records, field_map)
        .await
}
