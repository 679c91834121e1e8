//! Built-in library datasets and how their source fields land in the schema

use crate::error::ShelfloadResult;
use crate::types::{FieldMap, FieldMapping};

/// Name of the table holding library users
pub const PEOPLE_TABLE: &str = "people";
/// Name of the table holding books
pub const ITEMS_TABLE: &str = "items";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Users,
    Books,
}

impl Dataset {
    /// Key of the dataset inside a structured source document
    pub fn source_key(&self) -> &'static str {
        match self {
            Dataset::Users => "users",
            Dataset::Books => "books",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            Dataset::Users => PEOPLE_TABLE,
            Dataset::Books => ITEMS_TABLE,
        }
    }

    /// Source header to column mapping. Only the borrower of a book may be blank.
    pub fn field_map(&self) -> ShelfloadResult<FieldMap> {
        let entries = match self {
            Dataset::Users => vec![
                FieldMapping::text("imię", "name"),
                FieldMapping::text("nazwisko", "surname"),
                FieldMapping::text("adres zamieszkania", "address"),
                FieldMapping::text("PESEL", "national_id"),
                FieldMapping::text("adres mail", "email"),
                FieldMapping::integer("liczba wypożyczonych książek", "rented_count"),
            ],
            Dataset::Books => vec![
                FieldMapping::text("nazwa ksiązki", "title"),
                FieldMapping::text("autor", "author"),
                FieldMapping::text("indeks", "catalog_index"),
                FieldMapping::nullable_text("przez kogo wypożyczona", "borrower_id"),
                FieldMapping::integer("czas wypożyczenia", "loan_duration"),
            ],
        };
        FieldMap::new(entries)
    }
}
