//! Source readers turning CSV files and keyed JSON documents into record batches

pub mod csv_reader;
pub mod json_reader;

pub use csv_reader::{parse_csv, read_csv};
pub use json_reader::{find_dataset, parse_json_dataset, read_json_dataset};

use std::path::Path;
use tracing::info;

use crate::error::{ShelfloadError, ShelfloadResult};
use crate::types::RecordBatch;

/// Format of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Semicolon-separated text with a header row
    Csv,
    /// Object keyed by dataset name, each value an array of records
    Json,
}

impl SourceFormat {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> ShelfloadResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("json") => Ok(SourceFormat::Json),
            _ => Err(ShelfloadError::configuration(format!(
                "cannot infer source format of {}; pass it explicitly",
                path.display()
            ))),
        }
    }
}

/// Read a source file into a batch. `key` selects the dataset inside JSON
/// documents and is ignored for CSV.
pub fn load_source(path: &Path, format: Option<SourceFormat>, key: &str) -> ShelfloadResult<RecordBatch> {
    let format = match format {
        Some(format) => format,
        None => SourceFormat::from_path(path)?,
    };

    let batch = match format {
        SourceFormat::Csv => read_csv(path)?,
        SourceFormat::Json => read_json_dataset(path, key)?,
    };

    info!(path = %path.display(), format = ?format, records = batch.len(), "Loaded source");
    Ok(batch)
}
