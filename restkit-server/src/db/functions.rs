//! Stored function invocation
//!
//! `call_function("facturacion.ft_obtiene_formas_pago", &[])` runs
//! `SELECT * FROM facturacion.ft_obtiene_formas_pago()` and flattens the
//! common `RETURNS json` + `JSON_AGG(ROW_TO_JSON(...))` shape into a plain
//! list of rows.

use serde_json::Value;

use super::{Database, DbError, Param, QueryExecutor, Row};

/// `$1, $2, ..., $n`
fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the call statement for a function taking `param_count` arguments.
///
/// # Example
/// ```
/// use restkit_server::db::function_call_sql;
///
/// assert_eq!(function_call_sql("schema.fn", 0), "SELECT * FROM schema.fn()");
/// assert_eq!(function_call_sql("schema.fn", 2), "SELECT * FROM schema.fn($1, $2)");
/// ```
pub fn function_call_sql(name: &str, param_count: usize) -> String {
    format!("SELECT * FROM {}({})", name, placeholders(param_count))
}

/// Statement used only to learn what the server makes of untyped arguments.
///
/// Typed arguments carry their bind type so overloads resolve as they will
/// when the call runs. The trailing comment keeps this text apart from the
/// plain call in the per-connection statement cache.
fn inference_sql(name: &str, params: &[Param]) -> String {
    let args = params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            if param.is_untyped() {
                format!("${}", i + 1)
            } else {
                format!("${}::{}", i + 1, param.sql_type())
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT * FROM {}({}) -- parameter types", name, args)
}

/// Type name usable as a cast target, or `None` when casting to it would
/// change the value (`CHAR` alone means `char(1)`, `BIT` means `bit(1)`) or
/// the name is not a plain identifier.
fn cast_target(type_name: &str) -> Option<String> {
    let (base, array) = match type_name.strip_suffix("[]") {
        Some(base) => (base, "[]"),
        None => (type_name, ""),
    };
    let base = match base {
        "CHAR" => "BPCHAR",
        "BIT" => return None,
        other => other,
    };
    let plain = !base.is_empty() && base.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    plain.then(|| format!("{}{}", base, array))
}

/// Call statement where every placeholder states its bind type and untyped
/// arguments are cast on to the type the server inferred:
/// `SELECT * FROM fn($1::TEXT::DATE, $2::INT4)`.
fn typed_call_sql(name: &str, params: &[Param], inferred: &[Option<String>]) -> String {
    let args = params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let target = if param.is_untyped() {
                inferred.get(i).and_then(Option::as_deref).and_then(cast_target)
            } else {
                None
            };
            match target {
                Some(ty) => format!("${}::{}::{}", i + 1, param.sql_type(), ty),
                None => format!("${}::{}", i + 1, param.sql_type()),
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT * FROM {}({})", name, args)
}

/// Function name without its schema prefix.
fn base_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, base)| base)
}

/// Flatten a single-row, single-column function result.
///
/// Applied in order, only when there is exactly one row with exactly one column:
/// 1. the value is an array: its elements are the result;
/// 2. the value is an object holding a key equal to the function's base
///    name: that entry is the result (an array's elements, or the entry itself);
/// 3. anything else: the rows are returned unchanged.
///
/// A function that really returns one array-valued column is flattened too.
pub fn unwrap_function_result(name: &str, rows: Vec<Row>) -> Vec<Value> {
    let single = match rows.as_slice() {
        [row] if row.len() == 1 => row.values().next(),
        _ => None,
    };

    match single {
        Some(Value::Array(items)) => return items.clone(),
        Some(Value::Object(object)) => match object.get(base_name(name)) {
            Some(Value::Array(items)) => return items.clone(),
            Some(inner) => return vec![inner.clone()],
            None => {}
        },
        _ => {}
    }

    rows.into_iter().map(Value::Object).collect()
}

/// Call a stored function through any executor.
///
/// Text and null arguments are cast to the types the server infers for them,
/// so `"2024-05-01"` reaches a `date` argument and `NULL` an `integer` one.
/// That costs one extra prepare; calls with only typed arguments skip it.
pub async fn call_function<E>(
    executor: &E,
    name: &str,
    params: &[Param],
) -> Result<Vec<Value>, DbError>
where
    E: QueryExecutor + ?Sized,
{
    let sql = if params.iter().any(Param::is_untyped) {
        let inferred = executor
            .parameter_types(&inference_sql(name, params), params)
            .await
            .inspect_err(|e| {
                tracing::error!(function = name, error = %e, "Stored function failed");
            })?;
        if inferred.iter().any(Option::is_some) {
            typed_call_sql(name, params, &inferred)
        } else {
            function_call_sql(name, params.len())
        }
    } else {
        function_call_sql(name, params.len())
    };
    tracing::debug!(function = name, placeholders = %placeholders(params.len()), "Calling stored function");

    let rows = executor.execute(&sql, params).await.inspect_err(|e| {
        tracing::error!(function = name, error = %e, "Stored function failed");
    })?;

    Ok(unwrap_function_result(name, rows))
}

impl Database {
    /// Call a stored function on this pool. See [`call_function`].
    pub async fn call_function(&self, name: &str, params: &[Param]) -> Result<Vec<Value>, DbError> {
        call_function(self, name, params).await
    }
}
