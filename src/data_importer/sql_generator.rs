use crate::config::StoreKind;
use crate::types::FieldMap;

/// Parameterized INSERT built once per import and reused for every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// The SQL statement text
    pub sql: String,
    /// Table the statement writes to
    pub table_name: String,
    /// Number of positional parameters
    pub parameter_count: usize,
}

impl InsertStatement {
    /// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)` in field map order
    pub fn build(kind: StoreKind, table_name: &str, field_map: &FieldMap) -> Self {
        let columns = field_map
            .columns()
            .into_iter()
            .map(utils::escape_identifier)
            .collect::<Vec<_>>()
            .join(", ");

        let placeholders = (1..=field_map.len())
            .map(|i| kind.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                utils::escape_identifier(table_name),
                columns,
                placeholders
            ),
            table_name: table_name.to_string(),
            parameter_count: field_map.len(),
        }
    }
}

pub mod utils {
    /// Escape SQL identifier (table name, column name, etc.)
    pub fn escape_identifier(identifier: &str) -> String {
        if is_valid_identifier(identifier) {
            identifier.to_string()
        } else {
            format!("\"{}\"", identifier.replace('"', "\"\""))
        }
    }

    /// Whether the identifier can be used unquoted
    pub fn is_valid_identifier(identifier: &str) -> bool {
        !identifier.is_empty()
            && identifier.chars().all(|c| c.is_alphanumeric() || c == '_')
            && !identifier.chars().next().unwrap_or('0').is_ascii_digit()
    }
}
