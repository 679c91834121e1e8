use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ShelfloadResult;
use crate::types::{FieldValue, Record, RecordBatch};

const DELIMITER: u8 = b';';

/// Read a semicolon-separated UTF-8 file with a header row
pub fn read_csv(path: &Path) -> ShelfloadResult<RecordBatch> {
    let file = File::open(path)?;
    parse_csv(file)
}

/// Every value is kept as text; coercion happens at import time.
/// A short row leaves its trailing columns absent and fields past the last
/// header are ignored, so a ragged row fails on its own when imported.
pub fn parse_csv<R: Read>(reader: R) -> ShelfloadResult<RecordBatch> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), FieldValue::text(value)))
            .collect();
        records.push(record);
    }

    Ok(RecordBatch::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users_csv() {
        let data = "imię;nazwisko;adres zamieszkania;PESEL;adres mail;liczba wypożyczonych książek\n\
                    Anna;Nowak;Lodz;12345678901;a@x.pl;2\n\
                    Jan;Kowalski;Krakow;98765432109;j@x.pl;0\n";
        let batch = parse_csv(data.as_bytes()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[0]["imię"], FieldValue::text("Anna"));
        assert_eq!(batch.records[1]["liczba wypożyczonych książek"], FieldValue::text("0"));
    }

    #[test]
    fn test_empty_fields_stay_empty_text() {
        let data = "indeks;przez kogo wypożyczona\n9788324631766;\n";
        let batch = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(batch.records[0]["przez kogo wypożyczona"], FieldValue::text(""));
    }

    #[test]
    fn test_header_only_yields_empty_batch() {
        let batch = parse_csv("a;b\n".as_bytes()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_ragged_rows_keep_only_present_columns() {
        let data = "a;b;c\n1;2;3\n4;5\n6;7;8;9\n";
        let batch = parse_csv(data.as_bytes()).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.records[1].len(), 2);
        assert!(!batch.records[1].contains_key("c"));
        assert_eq!(batch.records[2].len(), 3);
        assert_eq!(batch.records[2]["c"], FieldValue::text("8"));
    }

    #[test]
    fn test_read_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Książki.csv");
        std::fs::write(&path, "autor;indeks\nLem;9788308049\n").unwrap();

        let batch = read_csv(&path).unwrap();
        assert_eq!(batch.records[0]["autor"], FieldValue::text("Lem"));
    }
}
