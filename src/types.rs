use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;

use crate::error::DataAccessError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_FORMAT_T: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Scalar values a caller can bind to a statement placeholder.
///
/// SQL NULL is not a variant: an absent value is expressed as `None` on the
/// [`ParameterBinding`], which keeps its type tag so the driver can bind a typed NULL.
/// ```rust
/// use sql_data_access::prelude::*;
///
/// let params = vec![
///     ParameterBinding::new("Alice", SqlType::VarChar),
///     ParameterBinding::new(24, SqlType::SmallInt),
///     ParameterBinding::null(SqlType::Timestamp),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Date and time without zone
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Timestamp(dt) => write!(f, "{}", dt.format(TIMESTAMP_FORMAT)),
            SqlValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            SqlValue::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            SqlValue::Blob(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

macro_rules! impl_from_for_sql_value {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant($conv(value))
                }
            }
        )*
    };
}

impl_from_for_sql_value! {
    i64 => Int(std::convert::identity),
    i32 => Int(i64::from),
    i16 => Int(i64::from),
    f64 => Float(std::convert::identity),
    f32 => Float(f64::from),
    bool => Bool(std::convert::identity),
    String => Text(std::convert::identity),
    &str => Text(str::to_owned),
    NaiveDateTime => Timestamp(std::convert::identity),
    NaiveDate => Date(std::convert::identity),
    NaiveTime => Time(std::convert::identity),
    Vec<u8> => Blob(std::convert::identity),
    &[u8] => Blob(<[u8]>::to_vec),
}

/// Wire type tag declared for a placeholder.
///
/// The tag decides how a value is converted before binding and which NULL type is sent
/// when the value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SqlType {
    #[value(name = "boolean")]
    Boolean,
    #[value(name = "smallint")]
    SmallInt,
    #[value(name = "integer")]
    Integer,
    #[value(name = "bigint")]
    BigInt,
    #[value(name = "real")]
    Real,
    #[value(name = "double")]
    Double,
    #[value(name = "char")]
    Char,
    #[value(name = "varchar")]
    VarChar,
    #[value(name = "text")]
    Text,
    #[value(name = "date")]
    Date,
    #[value(name = "time")]
    Time,
    #[value(name = "timestamp")]
    Timestamp,
    #[value(name = "binary")]
    Binary,
}

impl SqlType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE",
            SqlType::Char => "CHAR",
            SqlType::VarChar => "VARCHAR",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Binary => "BINARY",
        }
    }

    /// Convert `value` into the representation this tag expects.
    ///
    /// # Errors
    /// Returns `DataAccessError::ParameterError` when the value cannot be represented
    /// as this type (out of range integers, unparsable text, and so on).
    pub fn coerce(self, value: &SqlValue) -> Result<SqlValue, DataAccessError> {
        let mismatch = || {
            DataAccessError::ParameterError(format!(
                "cannot bind {} value {value} as {}",
                value.type_name(),
                self.name()
            ))
        };
        let coerced = match self {
            SqlType::Boolean => SqlValue::Bool(match value {
                SqlValue::Bool(b) => *b,
                SqlValue::Int(i) => *i != 0,
                SqlValue::Float(f) => *f != 0.0,
                SqlValue::Text(s) => parse_bool(s).ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            }),
            SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                let i = match value {
                    SqlValue::Int(i) => *i,
                    SqlValue::Bool(b) => i64::from(*b),
                    #[allow(clippy::cast_possible_truncation)]
                    SqlValue::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => *f as i64,
                    SqlValue::Text(s) => s.trim().parse::<i64>().map_err(|_| mismatch())?,
                    _ => return Err(mismatch()),
                };
                let in_range = match self {
                    SqlType::SmallInt => i16::try_from(i).is_ok(),
                    SqlType::Integer => i32::try_from(i).is_ok(),
                    _ => true,
                };
                if !in_range {
                    return Err(mismatch());
                }
                SqlValue::Int(i)
            }
            SqlType::Real | SqlType::Double => SqlValue::Float(match value {
                #[allow(clippy::cast_precision_loss)]
                SqlValue::Int(i) => *i as f64,
                SqlValue::Float(f) => *f,
                SqlValue::Bool(b) => f64::from(u8::from(*b)),
                SqlValue::Text(s) => s.trim().parse::<f64>().map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            }),
            SqlType::Char | SqlType::VarChar | SqlType::Text => match value {
                SqlValue::Blob(bytes) => {
                    SqlValue::Text(String::from_utf8(bytes.clone()).map_err(|_| mismatch())?)
                }
                other => SqlValue::Text(other.to_string()),
            },
            SqlType::Date => SqlValue::Date(match value {
                SqlValue::Date(d) => *d,
                SqlValue::Timestamp(dt) => dt.date(),
                SqlValue::Text(s) => {
                    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| mismatch())?
                }
                _ => return Err(mismatch()),
            }),
            SqlType::Time => SqlValue::Time(match value {
                SqlValue::Time(t) => *t,
                SqlValue::Timestamp(dt) => dt.time(),
                SqlValue::Text(s) => {
                    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT).map_err(|_| mismatch())?
                }
                _ => return Err(mismatch()),
            }),
            SqlType::Timestamp => SqlValue::Timestamp(match value {
                SqlValue::Timestamp(dt) => *dt,
                SqlValue::Date(d) => d.and_time(NaiveTime::MIN),
                SqlValue::Text(s) => parse_timestamp(s.trim()).ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            }),
            SqlType::Binary => SqlValue::Blob(match value {
                SqlValue::Blob(bytes) => bytes.clone(),
                SqlValue::Text(s) => s.clone().into_bytes(),
                _ => return Err(mismatch()),
            }),
        };
        Ok(coerced)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT_T))
        .ok()
}

/// A value paired with the wire type it must be bound as.
///
/// Immutable once built. Passed to [`crate::ConnectionManager::prepare`] in placeholder
/// order, or to [`crate::PreparedExecution::bind`] for a single position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    value: Option<SqlValue>,
    sql_type: SqlType,
}

impl ParameterBinding {
    #[must_use]
    pub fn new(value: impl Into<SqlValue>, sql_type: SqlType) -> Self {
        Self {
            value: Some(value.into()),
            sql_type,
        }
    }

    /// A binding that sends SQL NULL typed as `sql_type`.
    #[must_use]
    pub fn null(sql_type: SqlType) -> Self {
        Self {
            value: None,
            sql_type,
        }
    }

    #[must_use]
    pub fn from_option<V: Into<SqlValue>>(value: Option<V>, sql_type: SqlType) -> Self {
        Self {
            value: value.map(Into::into),
            sql_type,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// The value converted to the declared type, or `None` for a typed NULL.
    ///
    /// # Errors
    /// Returns `DataAccessError::ParameterError` if the conversion is impossible.
    pub fn coerced(&self) -> Result<Option<SqlValue>, DataAccessError> {
        self.value
            .as_ref()
            .map(|v| self.sql_type.coerce(v))
            .transpose()
    }
}

impl Default for ParameterBinding {
    fn default() -> Self {
        Self::null(SqlType::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_value_stays_absent_with_its_tag() {
        let p = ParameterBinding::null(SqlType::VarChar);
        assert_eq!(p.coerced().unwrap(), None);
        assert_eq!(p.sql_type(), SqlType::VarChar);
        assert_eq!(ParameterBinding::default().sql_type(), SqlType::Integer);
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(
            ParameterBinding::new(24, SqlType::SmallInt).coerced().unwrap(),
            Some(SqlValue::Int(24))
        );
        assert!(ParameterBinding::new(40_000, SqlType::SmallInt).coerced().is_err());
        assert!(
            ParameterBinding::new(i64::from(i32::MAX) + 1, SqlType::Integer)
                .coerced()
                .is_err()
        );
        assert_eq!(
            ParameterBinding::new(" 42 ", SqlType::BigInt).coerced().unwrap(),
            Some(SqlValue::Int(42))
        );
        assert!(ParameterBinding::new("4x", SqlType::Integer).coerced().is_err());
    }

    #[test]
    fn character_types_render_text() {
        assert_eq!(
            ParameterBinding::new(24, SqlType::VarChar).coerced().unwrap(),
            Some(SqlValue::Text("24".into()))
        );
        let dt = NaiveDate::from_ymd_opt(2014, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            ParameterBinding::new(dt, SqlType::Char).coerced().unwrap(),
            Some(SqlValue::Text("2014-12-31 23:59:59".into()))
        );
    }

    #[test]
    fn temporal_text_is_parsed() {
        let ts = ParameterBinding::new("2014-12-31T23:59:59.999", SqlType::Timestamp)
            .coerced()
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2014, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap();
        assert_eq!(ts, Some(SqlValue::Timestamp(expected)));
        assert!(ParameterBinding::new("yesterday", SqlType::Date).coerced().is_err());
        assert_eq!(
            ParameterBinding::new(expected, SqlType::Date).coerced().unwrap(),
            Some(SqlValue::Date(expected.date()))
        );
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(
            SqlType::Boolean.coerce(&SqlValue::Text("T".into())).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            SqlType::Boolean.coerce(&SqlValue::Int(0)).unwrap(),
            SqlValue::Bool(false)
        );
        assert!(SqlType::Boolean.coerce(&SqlValue::Text("maybe".into())).is_err());
    }

    #[test]
    fn type_tags_parse_from_cli_names() {
        assert_eq!(SqlType::from_str("varchar", true).unwrap(), SqlType::VarChar);
        assert_eq!(SqlType::from_str("SMALLINT", true).unwrap(), SqlType::SmallInt);
        assert!(SqlType::from_str("uuid", true).is_err());
    }
}
