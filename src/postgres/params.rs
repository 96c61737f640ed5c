use tokio_postgres::types::ToSql;

use crate::error::DataAccessError;
use crate::types::{ParameterBinding, SqlType, SqlValue};

pub(crate) type PgParam = Box<dyn ToSql + Sync>;

macro_rules! typed_param {
    ($value:expr, $variant:ident, $map:expr) => {{
        let mapped = match $value {
            None => None,
            Some(SqlValue::$variant(inner)) => Some($map(inner)?),
            Some(other) => {
                return Err(DataAccessError::ParameterError(format!(
                    "unexpected value {other:?} after coercion"
                )));
            }
        };
        Box::new(mapped) as PgParam
    }};
}

fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T, DataAccessError> {
    T::try_from(value)
        .map_err(|_| DataAccessError::ParameterError(format!("{value} is out of range")))
}

#[allow(clippy::unnecessary_wraps)]
fn same<T>(value: T) -> Result<T, DataAccessError> {
    Ok(value)
}

/// Convert a binding to a `ToSql` value whose Rust type follows the declared tag.
///
/// An absent value becomes `Option::<T>::None` for the tag's `T`, so Postgres receives a
/// NULL of the declared type.
///
/// # Errors
/// Returns `DataAccessError::ParameterError` if the value does not fit its declared type.
pub(crate) fn to_sql_param(binding: &ParameterBinding) -> Result<PgParam, DataAccessError> {
    let value = binding.coerced()?;
    let param = match binding.sql_type() {
        SqlType::Boolean => typed_param!(value, Bool, same),
        SqlType::SmallInt => typed_param!(value, Int, narrow::<i16>),
        SqlType::Integer => typed_param!(value, Int, narrow::<i32>),
        SqlType::BigInt => typed_param!(value, Int, same),
        #[allow(clippy::cast_possible_truncation)]
        SqlType::Real => typed_param!(value, Float, |f: f64| same(f as f32)),
        SqlType::Double => typed_param!(value, Float, same),
        SqlType::Char | SqlType::VarChar | SqlType::Text => typed_param!(value, Text, same),
        SqlType::Date => typed_param!(value, Date, same),
        SqlType::Time => typed_param!(value, Time, same),
        SqlType::Timestamp => typed_param!(value, Timestamp, same),
        SqlType::Binary => typed_param!(value, Blob, same),
    };
    Ok(param)
}

/// Convert every placeholder binding, failing on the first unbound position.
///
/// # Errors
/// Returns `DataAccessError::ParameterError` for unbound or unconvertible parameters.
pub(crate) fn convert_all(
    bindings: &[Option<ParameterBinding>],
) -> Result<Vec<PgParam>, DataAccessError> {
    bindings
        .iter()
        .enumerate()
        .map(|(idx, binding)| {
            let binding = binding.as_ref().ok_or_else(|| {
                DataAccessError::ParameterError(format!(
                    "no value specified for parameter {}",
                    idx + 1
                ))
            })?;
            to_sql_param(binding)
        })
        .collect()
}
