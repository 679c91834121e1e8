// Record import: field coercion, insert generation and the import loop
pub mod coercion;
pub mod datasets;
pub mod importer;
pub mod pipeline;
pub mod sql_generator;


// Re-export main types and functions
pub use coercion::{coerce, extract_row};
pub use datasets::{Dataset, ITEMS_TABLE, PEOPLE_TABLE};
pub use importer::{import_records, CommitMode, ImportOptions, ImportResult, RecordFailure, RecordImporter};
pub use pipeline::{run_import, ImportJob};
pub use sql_generator::InsertStatement;
