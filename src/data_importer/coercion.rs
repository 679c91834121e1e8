use crate::error::RecordError;
use crate::types::{Coercion, FieldMap, FieldMapping, FieldValue, Record};

/// Extract a record's values positionally in field map order, coercing each
pub fn extract_row(record: &Record, field_map: &FieldMap) -> Result<Vec<FieldValue>, RecordError> {
    field_map
        .iter()
        .map(|mapping| coerce(record.get(&mapping.source), mapping))
        .collect()
}

/// Apply one mapping's coercion to a (possibly absent) source value
pub fn coerce(value: Option<&FieldValue>, mapping: &FieldMapping) -> Result<FieldValue, RecordError> {
    match mapping.coercion {
        Coercion::NullableText => match value {
            None => Ok(FieldValue::Null),
            Some(v) if v.is_blank() => Ok(FieldValue::Null),
            Some(FieldValue::Integer(i)) => Ok(FieldValue::Text(i.to_string())),
            Some(v) => Ok(v.clone()),
        },
        Coercion::Text => match require(value, mapping)? {
            FieldValue::Integer(i) => Ok(FieldValue::Text(i.to_string())),
            v => Ok(v.clone()),
        },
        Coercion::Integer => match require(value, mapping)? {
            FieldValue::Null => Err(RecordError::InvalidInteger {
                field: mapping.source.clone(),
                value: FieldValue::Null.to_string(),
            }),
            FieldValue::Integer(i) => Ok(FieldValue::Integer(*i)),
            FieldValue::Text(s) => s.trim().parse::<i64>().map(FieldValue::Integer).map_err(|_| {
                RecordError::InvalidInteger {
                    field: mapping.source.clone(),
                    value: s.clone(),
                }
            }),
        },
    }
}

fn require<'a>(value: Option<&'a FieldValue>, mapping: &FieldMapping) -> Result<&'a FieldValue, RecordError> {
    value.ok_or_else(|| RecordError::MissingField {
        field: mapping.source.clone(),
    })
}
