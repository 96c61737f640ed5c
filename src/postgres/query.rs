use std::error::Error;
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};

use crate::error::DataAccessError;
use crate::results::ResultTable;

type DecodeError = Box<dyn Error + Sync + Send>;

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Text form of any column value, whatever its server type.
struct CellText(String);

impl<'a> FromSql<'a> for CellText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        render(ty, raw).map(CellText)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn render(ty: &Type, raw: &[u8]) -> Result<String, DecodeError> {
    match ty.kind() {
        Kind::Simple => render_simple(ty, raw),
        Kind::Enum(_) => Ok(std::str::from_utf8(raw)?.to_owned()),
        Kind::Domain(base) => render(base, raw),
        _ => Ok(bytea_text(raw)),
    }
}

fn render_simple(ty: &Type, raw: &[u8]) -> Result<String, DecodeError> {
    let text = match ty.name() {
        "bool" => String::from(if bool::from_sql(ty, raw)? { "t" } else { "f" }),
        "char" => char::from(i8::from_sql(ty, raw)?.to_ne_bytes()[0]).to_string(),
        "int2" => i16::from_sql(ty, raw)?.to_string(),
        "int4" => i32::from_sql(ty, raw)?.to_string(),
        "int8" => i64::from_sql(ty, raw)?.to_string(),
        "oid" => u32::from_sql(ty, raw)?.to_string(),
        "float4" => f32::from_sql(ty, raw)?.to_string(),
        "float8" => f64::from_sql(ty, raw)?.to_string(),
        "numeric" => numeric_text(raw)?,
        "text" | "varchar" | "bpchar" | "name" | "unknown" | "citext" | "xml" => {
            <&str>::from_sql(ty, raw)?.to_owned()
        }
        "timestamp" => NaiveDateTime::from_sql(ty, raw)?
            .format("%Y-%m-%d %H:%M:%S%.f")
            .to_string(),
        "timestamptz" => DateTime::<Utc>::from_sql(ty, raw)?
            .format("%Y-%m-%d %H:%M:%S%.f%:z")
            .to_string(),
        "date" => NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string(),
        "time" => NaiveTime::from_sql(ty, raw)?.format("%H:%M:%S%.f").to_string(),
        "interval" => interval_text(raw)?,
        "uuid" => uuid_text(raw)?,
        "inet" | "cidr" => inet_text(raw)?,
        "json" | "jsonb" => JsonValue::from_sql(ty, raw)?.to_string(),
        _ => bytea_text(raw),
    };
    Ok(text)
}

fn bytea_text(raw: &[u8]) -> String {
    format!("\\x{}", hex::encode(raw))
}

fn take<const N: usize>(raw: &[u8], pos: &mut usize) -> Result<[u8; N], DecodeError> {
    let bytes = raw
        .get(*pos..*pos + N)
        .ok_or("value shorter than its wire format")?;
    *pos += N;
    Ok(bytes.try_into()?)
}

/// Exact decimal text of a binary `numeric`: base-10000 digit groups, a group weight
/// and a display scale.
fn numeric_text(raw: &[u8]) -> Result<String, DecodeError> {
    let mut pos = 0;
    let ndigits = i16::from_be_bytes(take(raw, &mut pos)?);
    let weight = i32::from(i16::from_be_bytes(take(raw, &mut pos)?));
    let sign = u16::from_be_bytes(take(raw, &mut pos)?);
    let dscale = usize::from(u16::from_be_bytes(take(raw, &mut pos)?));
    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }
    let mut digits = Vec::with_capacity(usize::try_from(ndigits).unwrap_or(0));
    for _ in 0..ndigits {
        digits.push(i16::from_be_bytes(take(raw, &mut pos)?));
    }
    let group = |idx: i32| -> i16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG && !digits.iter().all(|d| *d == 0) {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for idx in 0..=weight {
            if idx == 0 {
                write!(out, "{}", group(idx))?;
            } else {
                write!(out, "{:04}", group(idx))?;
            }
        }
    }
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut idx = weight + 1;
        while frac.len() < dscale {
            write!(frac, "{:04}", group(idx))?;
            idx += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

fn plural(n: i32, unit: &str, units: &str) -> String {
    if n.abs() == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {units}")
    }
}

/// `interval` in the server's default output style, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn interval_text(raw: &[u8]) -> Result<String, DecodeError> {
    let mut pos = 0;
    let micros = i64::from_be_bytes(take(raw, &mut pos)?);
    let days = i32::from_be_bytes(take(raw, &mut pos)?);
    let months = i32::from_be_bytes(take(raw, &mut pos)?);

    let mut parts = Vec::new();
    let (years, mons) = (months / 12, months % 12);
    if years != 0 {
        parts.push(plural(years, "year", "years"));
    }
    if mons != 0 {
        parts.push(plural(mons, "mon", "mons"));
    }
    if days != 0 {
        parts.push(plural(days, "day", "days"));
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let (secs, frac) = (abs / 1_000_000, abs % 1_000_000);
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac > 0 {
            let digits = format!("{frac:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }
    Ok(parts.join(" "))
}

fn uuid_text(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.len() != 16 {
        return Err("uuid must be 16 bytes".into());
    }
    let h = hex::encode(raw);
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    ))
}

/// `inet`/`cidr`: the netmask is shown for networks and for hosts with a short prefix.
fn inet_text(raw: &[u8]) -> Result<String, DecodeError> {
    let mut pos = 0;
    let [family, bits, is_cidr, len] = take::<4>(raw, &mut pos)?;
    let addr = raw.get(pos..).ok_or("inet address missing")?;
    let (ip, full) = match (family, len) {
        (2, 4) => (IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(addr)?)), 32),
        (3, 16) => (IpAddr::V6(Ipv6Addr::from(<[u8; 16]>::try_from(addr)?)), 128),
        _ => return Err(format!("unknown inet family {family}").into()),
    };
    if is_cidr != 0 || bits != full {
        Ok(format!("{ip}/{bits}"))
    } else {
        Ok(ip.to_string())
    }
}

/// Render the value at `idx` the way it appears in a result cell.
///
/// # Errors
/// Returns `DataAccessError::PostgresError` if the server sent a value that does not
/// match its own wire format.
pub(crate) fn cell_text(row: &Row, idx: usize) -> Result<Option<String>, DataAccessError> {
    Ok(row.try_get::<_, Option<CellText>>(idx)?.map(|cell| cell.0))
}

/// Buffer rows from a finished query, shaped by the statement's column metadata.
///
/// # Errors
/// Returns `DataAccessError` if a value cannot be read or rendered.
pub(crate) fn build_result_table(
    columns: &[tokio_postgres::Column],
    rows: &[Row],
) -> Result<ResultTable, DataAccessError> {
    let column_names = columns.iter().map(|c| c.name().to_string()).collect();
    let mut table = ResultTable::new(column_names);
    let column_count = table.column_count();
    for row in rows {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(cell_text(row, idx)?);
        }
        table.add_row_values(cells)?;
    }
    Ok(table)
}
