//! Conversions between MySQL wire values and JSON

use serde_json::{Value, json};
use sqlx::mysql::types::{MySqlTime, MySqlTimeSign};
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::types::BigDecimal;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{Column, MySql, Row as _, TypeInfo, ValueRef};

use crate::driver::Row;

/// How a column's values are rendered as JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Null,
    Boolean,
    Signed,
    Unsigned,
    Float,
    Double,
    /// Rendered as a string to keep precision
    Decimal,
    Date,
    DateTime,
    Timestamp,
    /// Signed interval that may exceed 24 hours
    Time,
    Json,
    Binary,
    Text,
}

impl ColumnKind {
    /// Map a MySQL type name as reported by the driver
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "NULL" => Self::Null,
            "BOOLEAN" => Self::Boolean,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => Self::Signed,
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => Self::Unsigned,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "JSON" => Self::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => Self::Binary,
            _ => Self::Text,
        }
    }
}

/// Convert a driver row into a JSON object keyed by column name
pub fn row_to_json(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut object = Row::with_capacity(row.columns().len());

    for column in row.columns() {
        let kind = ColumnKind::from_type_name(column.type_info().name());
        let value = column_to_json(row, column.ordinal(), kind)?;
        object.insert(column.name().to_string(), value);
    }

    Ok(object)
}

fn column_to_json(row: &MySqlRow, index: usize, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match kind {
        ColumnKind::Null => Value::Null,
        ColumnKind::Boolean => json!(row.try_get_unchecked::<bool, _>(index)?),
        ColumnKind::Signed => json!(row.try_get_unchecked::<i64, _>(index)?),
        ColumnKind::Unsigned => json!(row.try_get_unchecked::<u64, _>(index)?),
        ColumnKind::Float => json!(row.try_get::<f32, _>(index)?),
        ColumnKind::Double => json!(row.try_get::<f64, _>(index)?),
        ColumnKind::Decimal => json!(row.try_get::<BigDecimal, _>(index)?.to_string()),
        ColumnKind::Date => match row.try_get::<NaiveDate, _>(index) {
            Ok(date) => json!(date.to_string()),
            Err(_) => zero_temporal_to_json(kind, &raw_bytes(row, index)?),
        },
        ColumnKind::DateTime => match row.try_get::<NaiveDateTime, _>(index) {
            Ok(datetime) => json!(datetime.to_string()),
            Err(_) => zero_temporal_to_json(kind, &raw_bytes(row, index)?),
        },
        ColumnKind::Timestamp => match row.try_get::<DateTime<Utc>, _>(index) {
            Ok(timestamp) => json!(timestamp.to_rfc3339()),
            Err(_) => zero_temporal_to_json(kind, &raw_bytes(row, index)?),
        },
        ColumnKind::Time => json!(format_time(&row.try_get::<MySqlTime, _>(index)?)),
        ColumnKind::Json => row.try_get::<Value, _>(index)?,
        ColumnKind::Binary => bytes_to_json(&raw_bytes(row, index)?),
        ColumnKind::Text => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => Value::String(text),
            Err(_) => bytes_to_json(&raw_bytes(row, index)?),
        },
    };

    Ok(value)
}

fn raw_bytes(row: &MySqlRow, index: usize) -> Result<Vec<u8>, sqlx::Error> {
    row.try_get_unchecked::<Vec<u8>, _>(index)
}

fn bytes_to_json(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

/// `[-]HH:MM:SS[.ffffff]`, the server's own text rendering of TIME
fn format_time(time: &MySqlTime) -> String {
    let sign = match time.sign() {
        MySqlTimeSign::Negative => "-",
        MySqlTimeSign::Positive => "",
    };
    let mut text = format!(
        "{sign}{:02}:{:02}:{:02}",
        time.hours(),
        time.minutes(),
        time.seconds()
    );
    if time.microseconds() != 0 {
        text.push_str(&format!(".{:06}", time.microseconds()));
    }
    text
}

/// Render a DATE, DATETIME or TIMESTAMP chrono rejects, such as `0000-00-00`.
///
/// Text protocol values are returned as sent. Binary protocol values are a
/// length byte followed by year (u16 LE), month, day, then optionally hour,
/// minute, second and microseconds (u32 LE); absent fields are zero.
fn zero_temporal_to_json(kind: ColumnKind, bytes: &[u8]) -> Value {
    if bytes.first().is_some_and(u8::is_ascii_digit) && bytes.is_ascii() {
        return bytes_to_json(bytes);
    }

    let field = |i: usize| bytes.get(i).copied().unwrap_or(0);
    let year = u16::from_le_bytes([field(1), field(2)]);
    let date = format!("{year:04}-{:02}-{:02}", field(3), field(4));
    if kind == ColumnKind::Date {
        return Value::String(date);
    }

    let mut text = format!("{date} {:02}:{:02}:{:02}", field(5), field(6), field(7));
    let micros = u32::from_le_bytes([field(8), field(9), field(10), field(11)]);
    if micros != 0 {
        text.push_str(&format!(".{micros:06}"));
    }
    Value::String(text)
}

/// Bind positional JSON values to `?` placeholders
pub fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(u) = n.as_u64() {
                    query.bind(u)
                } else {
                    query.bind(n.as_f64())
                }
            }
            Value::String(s) => query.bind(s.clone()),
            // Arrays and objects go over the wire as JSON text
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        };
    }
    query
}
