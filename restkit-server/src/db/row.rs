//! Query parameters and result rows
//!
//! Parameters are bound positionally (`$1`, `$2`, ...) in slice order.
//! Rows come back as column name -> JSON value maps so callers can hand
//! them straight to an HTTP response.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::types::{Oid, PgInterval};
use sqlx::postgres::{PgArguments, PgRow, PgTypeInfo, PgTypeKind};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, Type, TypeInfo, ValueRef};
use uuid::Uuid;

use super::DbError;

/// One result row: column name to value.
pub type Row = Map<String, Value>;

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    /// Bound as `jsonb`
    Json(Value),
}

impl Param {
    /// Text and null carry no type of their own: `'2024-05-01'` may be meant
    /// as a date and `NULL` fits any argument.
    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Null | Self::Text(_))
    }

    /// SQL type the value is bound as.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Null | Self::Text(_) => "TEXT",
            Self::Bool(_) => "BOOL",
            Self::Int(_) => "INT4",
            Self::BigInt(_) => "INT8",
            Self::Float(_) => "FLOAT8",
            Self::Json(_) => "JSONB",
        }
    }

    /// Type declared when asking the server to infer parameter types.
    /// OID 0 leaves untyped values for the server to resolve.
    pub(crate) fn declared_type(&self) -> PgTypeInfo {
        match self {
            Self::Null | Self::Text(_) => PgTypeInfo::with_oid(Oid(0)),
            Self::Bool(_) => <bool as Type<Postgres>>::type_info(),
            Self::Int(_) => <i32 as Type<Postgres>>::type_info(),
            Self::BigInt(_) => <i64 as Type<Postgres>>::type_info(),
            Self::Float(_) => <f64 as Type<Postgres>>::type_info(),
            Self::Json(_) => <sqlx::types::Json<Value> as Type<Postgres>>::type_info(),
        }
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Integers that fit in `int4` bind as `Int` so they resolve against
/// `integer` function arguments; anything wider becomes `BigInt`. Unsigned
/// values past `i64::MAX` go as text so no digits are lost.
impl From<Value> for Param {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => i32::try_from(i).map_or(Self::BigInt(i), Self::Int),
                None if n.is_u64() => Self::Text(n.to_string()),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

/// Bind every parameter, in order, onto a sqlx query.
pub(crate) fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Param],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<String>),
            Param::Bool(v) => query.bind(*v),
            Param::Int(v) => query.bind(*v),
            Param::BigInt(v) => query.bind(*v),
            Param::Float(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Json(v) => query.bind(sqlx::types::Json(v)),
        };
    }
    query
}

/// Convert a driver row into a JSON object keyed by column name.
pub(crate) fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    let mut out = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info()).map_err(|source| {
            DbError::Decode {
                column: column.name().to_owned(),
                source,
            }
        })?;
        out.insert(column.name().to_owned(), value);
    }
    Ok(out)
}

fn rfc3339(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339())
}

fn strings<T: ToString>(items: Vec<T>) -> Value {
    Value::from(items.iter().map(T::to_string).collect::<Vec<_>>())
}

/// `\x`-prefixed hex, the form PostgreSQL prints bytea in.
fn bytea_hex(bytes: &[u8]) -> Value {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    Value::String(out)
}

fn interval(value: PgInterval) -> Value {
    serde_json::json!({
        "months": value.months,
        "days": value.days,
        "microseconds": value.microseconds,
    })
}

/// Types without a dedicated arm must decode as text; anything else is a
/// `Decode` error rather than a made-up `null`.
fn decode_column(row: &PgRow, index: usize, type_info: &PgTypeInfo) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_info.name() {
        "BOOL" => Value::Bool(row.try_get(index)?),
        "INT2" => Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => Value::from(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => Value::from(row.try_get::<f64, _>(index)?),
        // Kept as text so no precision is lost on the way to JSON
        "NUMERIC" => Value::String(row.try_get::<Decimal, _>(index)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index)?,
        "UUID" => Value::String(row.try_get::<Uuid, _>(index)?.to_string()),
        "TIMESTAMPTZ" => rfc3339(row.try_get::<DateTime<Utc>, _>(index)?),
        "TIMESTAMP" => Value::String(
            row.try_get::<NaiveDateTime, _>(index)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "INTERVAL" => interval(row.try_get::<PgInterval, _>(index)?),
        "BYTEA" => bytea_hex(&row.try_get::<Vec<u8>, _>(index)?),
        "TEXT[]" | "VARCHAR[]" => Value::from(row.try_get::<Vec<String>, _>(index)?),
        "BOOL[]" => Value::from(row.try_get::<Vec<bool>, _>(index)?),
        "INT2[]" => Value::from(row.try_get::<Vec<i16>, _>(index)?),
        "INT4[]" => Value::from(row.try_get::<Vec<i32>, _>(index)?),
        "INT8[]" => Value::from(row.try_get::<Vec<i64>, _>(index)?),
        "FLOAT4[]" => Value::from(row.try_get::<Vec<f32>, _>(index)?),
        "FLOAT8[]" => Value::from(row.try_get::<Vec<f64>, _>(index)?),
        "NUMERIC[]" => strings(row.try_get::<Vec<Decimal>, _>(index)?),
        "UUID[]" => strings(row.try_get::<Vec<Uuid>, _>(index)?),
        "DATE[]" => strings(row.try_get::<Vec<NaiveDate>, _>(index)?),
        "TIMESTAMPTZ[]" => Value::from(
            row.try_get::<Vec<DateTime<Utc>>, _>(index)?
                .into_iter()
                .map(rfc3339)
                .collect::<Vec<_>>(),
        ),
        "JSON[]" | "JSONB[]" => Value::from(row.try_get::<Vec<Value>, _>(index)?),
        // Enum values arrive as their label
        _ if matches!(type_info.kind(), PgTypeKind::Enum(_)) => {
            Value::String(row.try_get_unchecked::<String, _>(index)?)
        }
        _ => Value::String(row.try_get::<String, _>(index)?),
    };

    Ok(value)
}
