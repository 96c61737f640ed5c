use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DataAccessError;
use crate::types::{ParameterBinding, SqlValue};

/// Convert a binding to the rusqlite value sent for its placeholder.
///
/// The value is first coerced to the binding's declared type. `SQLite` NULLs carry no
/// type, so an absent value of any tag becomes `Value::Null`.
///
/// # Errors
/// Returns `DataAccessError::ParameterError` if the value does not fit its declared type.
pub(crate) fn binding_to_value(binding: &ParameterBinding) -> Result<Value, DataAccessError> {
    let Some(value) = binding.coerced()? else {
        return Ok(Value::Null);
    };
    Ok(match value {
        SqlValue::Int(i) => Value::Integer(i),
        SqlValue::Float(f) => Value::Real(f),
        SqlValue::Bool(b) => Value::Integer(i64::from(b)),
        SqlValue::Blob(bytes) => Value::Blob(bytes),
        SqlValue::Text(s) => Value::Text(s),
        // temporal values are stored in SQLite's text date/time format
        temporal @ (SqlValue::Timestamp(_) | SqlValue::Date(_) | SqlValue::Time(_)) => {
            Value::Text(temporal.to_string())
        }
    })
}

/// Bind every placeholder, 1-based, in order.
///
/// # Errors
/// Returns `DataAccessError::ParameterError` when a placeholder has no binding or a value
/// cannot be converted, and `DataAccessError::SqliteError` when rusqlite rejects it.
pub(crate) fn bind_all(
    stmt: &mut Statement<'_>,
    bindings: &[Option<ParameterBinding>],
) -> Result<(), DataAccessError> {
    for (idx, binding) in bindings.iter().enumerate() {
        let position = idx + 1;
        let binding = binding.as_ref().ok_or_else(|| {
            DataAccessError::ParameterError(format!("no value specified for parameter {position}"))
        })?;
        stmt.raw_bind_parameter(position, binding_to_value(binding)?)?;
    }
    Ok(())
}
