//! Metadata-driven preprocessing of row batches
//!
//! Every chunk goes through the same three steps before it reaches a caller:
//! column names are checked against the catalog and put in catalog order,
//! text-encoded values are coerced to their declared type, and temporal
//! values are canonicalized.

use std::collections::BTreeSet;

use tracing::warn;

use super::error::SourceError;
use crate::catalog::{MetadataCatalog, VariableType};
use crate::models::value::whole_i64;
use crate::models::{DataFrame, Value};

/// Rename a frame's columns to the catalog's spelling and check they match
pub fn normalize_columns(
    frame: &mut DataFrame,
    catalog: &MetadataCatalog,
    address: &str,
) -> Result<(), SourceError> {
    frame.rename_columns(|name| catalog.normalize_name(name));
    let observed: BTreeSet<String> = frame.column_names().into_iter().collect();
    let declared: BTreeSet<String> = catalog.variable_names().into_iter().collect();
    if observed == declared && observed.len() == frame.num_columns() {
        return Ok(());
    }
    let missing: Vec<String> = declared.difference(&observed).cloned().collect();
    let unexpected: Vec<String> = observed.difference(&declared).cloned().collect();
    Err(SourceError::SchemaDrift {
        address: address.to_string(),
        missing,
        unexpected,
    })
}

/// Check, coerce and canonicalize one chunk
pub fn preprocess_chunk(
    mut frame: DataFrame,
    catalog: &MetadataCatalog,
    address: &str,
) -> Result<DataFrame, SourceError> {
    normalize_columns(&mut frame, catalog, address)?;
    frame.reorder_columns(&catalog.variable_names())?;
    for index in 0..frame.num_columns() {
        frame.map_column_values(
            index,
            |name: &str, values: Vec<Value>| -> Result<Vec<Value>, SourceError> {
                let variable_type = catalog.get_type(name)?;
                let values = technical_preprocessing(name, variable_type, values);
                Ok(catalog.format_datetime_data(name, values)?)
            },
        )?;
    }
    Ok(frame)
}

/// Coerce text-encoded values of non-temporal variables to their type
///
/// Values that cannot be converted become missing, with one warning per
/// variable.
pub fn technical_preprocessing(
    name: &str,
    variable_type: VariableType,
    values: Vec<Value>,
) -> Vec<Value> {
    if variable_type.is_temporal() {
        return values;
    }
    let mut rejected = 0usize;
    let coerced: Vec<Value> = values
        .into_iter()
        .map(|value| {
            let was_null = value.is_null();
            let result = coerce_value(value, variable_type);
            if result.is_null() && !was_null {
                rejected += 1;
            }
            result
        })
        .collect();
    if rejected > 0 {
        warn!(
            variable = name,
            variable_type = %variable_type,
            rejected,
            "Values could not be converted and were set to missing"
        );
    }
    coerced
}

/// Convert one value to a non-temporal type
pub fn coerce_value(value: Value, variable_type: VariableType) -> Value {
    match (value, variable_type) {
        (Value::Null, _) => Value::Null,
        (Value::Text(s), VariableType::Text) => Value::Text(s),
        (other, VariableType::Text) => Value::Text(other.to_string()),

        (Value::Integer(n), VariableType::Integer) => Value::Integer(n),
        (Value::Float(f), VariableType::Integer) => whole_i64(f).map_or(Value::Null, Value::Integer),
        (Value::Boolean(b), VariableType::Integer) => Value::Integer(i64::from(b)),
        (Value::Text(s), VariableType::Integer) => parse_integer(&s),

        (Value::Float(f), VariableType::Float) => Value::Float(f),
        (Value::Integer(n), VariableType::Float) => Value::Float(n as f64),
        (Value::Text(s), VariableType::Float) => {
            s.trim().parse::<f64>().map(Value::Float).unwrap_or(Value::Null)
        }

        (Value::Boolean(b), VariableType::Boolean) => Value::Boolean(b),
        (Value::Integer(n), VariableType::Boolean) => match n {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            _ => Value::Null,
        },
        (Value::Text(s), VariableType::Boolean) => parse_boolean(&s),

        // Temporal variables are left to datetime canonicalization
        (value, t) if t.is_temporal() => value,
        _ => Value::Null,
    }
}

fn parse_integer(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Integer(n);
    }
    // Exports often render whole numbers as "12.0"
    raw.parse::<f64>()
        .ok()
        .and_then(whole_i64)
        .map_or(Value::Null, Value::Integer)
}

fn parse_boolean(raw: &str) -> Value {
    match raw.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Value::Boolean(true),
        "false" | "f" | "no" | "n" | "0" => Value::Boolean(false),
        _ => Value::Null,
    }
}
