//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::rows::QueryRows;
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use lb_core::sql_utils::quote_literal;
use lb_core::ColumnInfo;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn query_sync(&self, sql: &str, params: &[Value]) -> DbResult<QueryRows> {
        let op_err = |e: duckdb::Error| DbError::OperationalError {
            sql: sql.to_string(),
            message: e.to_string(),
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(op_err)?;
        let mut rows_iter = stmt
            .query(duckdb::params_from_iter(params.iter().map(json_to_duck_value)))
            .map_err(op_err)?;

        let mut columns = Vec::new();
        if let Some(stmt_ref) = rows_iter.as_ref() {
            for idx in 0..stmt_ref.column_count() {
                let name = stmt_ref.column_name(idx).map_err(op_err)?;
                columns.push(name.to_string());
            }
        }

        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next().map_err(op_err)? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value = row.get_ref(idx).map_err(op_err)?.to_owned();
                values.push(duck_value_to_json(value));
            }
            rows.push(values);
        }

        Ok(QueryRows { columns, rows })
    }

    fn execute_sync(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(
            sql,
            duckdb::params_from_iter(params.iter().map(json_to_duck_value)),
        )
        .map_err(|e| DbError::OperationalError {
            sql: sql.to_string(),
            message: e.to_string(),
        })
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::OperationalError {
                sql: sql.to_string(),
                message: e.to_string(),
            })
    }
}

/// Matches the `STDIN` placeholder of bulk load statements
static STDIN_RE: OnceLock<Regex> = OnceLock::new();

fn stdin_token() -> &'static Regex {
    STDIN_RE.get_or_init(|| Regex::new(r"\bSTDIN\b").expect("valid regex"))
}

/// Replace the `STDIN` placeholder with the quoted file path
pub(crate) fn bind_stdin(sql: &str, path: &Path) -> String {
    let literal = quote_literal(&path.to_string_lossy());
    stdin_token()
        .replace_all(sql, regex::NoExpand(&literal))
        .into_owned()
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<QueryRows> {
        self.query_sync(sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn copy_from_file(&self, sql: &str, path: &Path) -> DbResult<usize> {
        if !stdin_token().is_match(sql) {
            return Err(DbError::OperationalError {
                sql: sql.to_string(),
                message: "bulk load statement has no STDIN placeholder".to_string(),
            });
        }
        self.execute_sync(&bind_stdin(sql, path), &[])
    }

    async fn describe(&self, sql: &str) -> DbResult<Vec<ColumnInfo>> {
        let describe_sql = format!(
            "DESCRIBE SELECT * FROM (\n{}\n)",
            sql.trim().trim_end_matches(';')
        );
        let rows = self.query_sync(&describe_sql, &[])?;
        let name_idx = rows.column_index("column_name").unwrap_or(0);
        let type_idx = rows.column_index("column_type").unwrap_or(1);

        Ok(rows
            .iter()
            .map(|row| ColumnInfo {
                name: value_to_string(row.get(name_idx)),
                data_type: value_to_string(row.get(type_idx)),
            })
            .collect())
    }

    async fn begin(&self) -> DbResult<()> {
        self.execute_batch_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.execute_batch_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.execute_batch_sync("ROLLBACK")
    }

    fn rollback_blocking(&self) -> DbResult<()> {
        self.execute_batch_sync("ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

fn value_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn json_to_duck_value(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Bool(b) => DuckValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DuckValue::BigInt(i)
            } else if let Some(f) = n.as_f64() {
                DuckValue::Double(f)
            } else {
                DuckValue::Text(n.to_string())
            }
        }
        Value::String(s) => DuckValue::Text(s.clone()),
        other => DuckValue::Text(other.to_string()),
    }
}

pub(crate) fn duck_value_to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::from(i),
        DuckValue::SmallInt(i) => Value::from(i),
        DuckValue::Int(i) => Value::from(i),
        DuckValue::BigInt(i) => Value::from(i),
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(i) => Value::from(i),
            Err(_) => numeric_text_to_json(i.to_string()),
        },
        DuckValue::UTinyInt(i) => Value::from(i),
        DuckValue::USmallInt(i) => Value::from(i),
        DuckValue::UInt(i) => Value::from(i),
        DuckValue::UBigInt(i) => Value::from(i),
        DuckValue::Float(f) => Value::from(f),
        DuckValue::Double(f) => Value::from(f),
        DuckValue::Decimal(d) => numeric_text_to_json(d.to_string()),
        DuckValue::Text(s) => Value::String(s),
        DuckValue::Enum(s) => Value::String(s),
        DuckValue::List(items) => Value::Array(items.into_iter().map(duck_value_to_json).collect()),
        other => Value::String(format!("{other:?}")),
    }
}

/// JSON number for a decimal rendering; text if it does not fit an f64
fn numeric_text_to_json(text: String) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
