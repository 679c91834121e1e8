use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ShelfloadError, ShelfloadResult};
use crate::types::{FieldValue, Record, RecordBatch};

/// Read the dataset stored under `key` from a JSON document file
pub fn read_json_dataset(path: &Path, key: &str) -> ShelfloadResult<RecordBatch> {
    let content = fs::read_to_string(path)?;
    parse_json_dataset(&content, key)
}

/// Parse a document of the form `{"<dataset>": [ {record}, ... ], ...}` and
/// return the records under `key`, matched without regard to case
pub fn parse_json_dataset(content: &str, key: &str) -> ShelfloadResult<RecordBatch> {
    let document: Value = serde_json::from_str(content)?;
    let document = document
        .as_object()
        .ok_or_else(|| ShelfloadError::malformed("top-level JSON value is not an object"))?;

    let (matched_key, value) = find_dataset(document, key)?;
    debug!(requested = key, matched = matched_key, "Located dataset in document");

    let entries = value.as_array().ok_or_else(|| {
        ShelfloadError::malformed(format!("dataset '{}' is not an array of records", matched_key))
    })?;

    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| to_record(index, entry))
        .collect();

    Ok(RecordBatch::new(records))
}

/// First top-level key equal to `key` ignoring letter case, in document order
pub fn find_dataset<'a>(document: &'a Map<String, Value>, key: &str) -> ShelfloadResult<(&'a str, &'a Value)> {
    let wanted = key.to_lowercase();
    document
        .iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| ShelfloadError::key_not_found(key))
}

/// A non-object entry becomes an empty record, which then fails on its own
/// at import time with its first missing field
fn to_record(index: usize, entry: &Value) -> Record {
    match entry.as_object() {
        Some(object) => object
            .iter()
            .map(|(name, value)| (name.clone(), to_field_value(value)))
            .collect(),
        None => {
            warn!(index, "Dataset entry is not a JSON object");
            Record::new()
        }
    }
}

/// Scalars keep their kind where possible; anything else is carried as text
/// and left for coercion to accept or reject
fn to_field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Text(n.to_string()),
        },
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        other => FieldValue::Text(other.to_string()),
    }
}
