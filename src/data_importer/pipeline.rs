use std::path::PathBuf;
use tracing::info;

use crate::config::StoreConfig;
use crate::data_importer::datasets::Dataset;
use crate::data_importer::importer::{ImportOptions, ImportResult, RecordImporter};
use crate::error::ShelfloadResult;
use crate::source::{load_source, SourceFormat};
use crate::store::{close_after, Connection, Store};

/// Everything needed to load one dataset from one source file
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub dataset: Dataset,
    pub source: PathBuf,
    /// Inferred from the file extension when absent
    pub format: Option<SourceFormat>,
    /// Dataset key inside a JSON document; defaults to the dataset's own key
    pub key: Option<String>,
    /// Destination table; defaults to the dataset's table
    pub table: Option<String>,
    pub options: ImportOptions,
}

impl ImportJob {
    pub fn new(dataset: Dataset, source: impl Into<PathBuf>) -> Self {
        Self {
            dataset,
            source: source.into(),
            format: None,
            key: None,
            table: None,
            options: ImportOptions::default(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(self.dataset.source_key())
    }

    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(self.dataset.table_name())
    }
}

/// Open the store, load the source, import it and close the store again.
///
/// The connection is closed on every path, including batch-fatal errors
/// raised while reading the source.
pub async fn run_import(config: &StoreConfig, job: &ImportJob) -> ShelfloadResult<ImportResult> {
    info!(
        dataset = ?job.dataset,
        source = %job.source.display(),
        table = job.table(),
        commit_mode = ?job.options.commit_mode,
        "Starting import"
    );

    let mut store = Connection::open(config).await?;
    let outcome = import_into(&mut store, job).await;
    close_after(store, outcome).await
}

async fn import_into<S: Store>(store: &mut S, job: &ImportJob) -> ShelfloadResult<ImportResult> {
    let records = load_source(&job.source, job.format, job.key())?;
    let field_map = job.dataset.field_map()?;

    RecordImporter::with_options(job.options.clone())
        .import_records(store, job.table(), &records, &field_map)
        .await
}
