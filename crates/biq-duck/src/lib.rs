//! DuckDB query executor
//!
//! Single-shot, read-only execution: a connection is opened, the query runs
//! exactly once, the full result is materialized into a [`ResultTable`] and
//! the connection is dropped before returning. No partial or streamed
//! results are exposed, and no retries happen here.

use biq_core::{truncate_diag, PipelineError, ResultTable, DIAG_LIMIT};
use duckdb::Connection;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The store rejected the query. The diagnostic is truncated to keep
    /// surfaced messages bounded.
    #[error("database error: {0}")]
    Database(String),
}

impl From<duckdb::Error> for ExecutionError {
    fn from(e: duckdb::Error) -> Self {
        ExecutionError::Database(truncate_diag(&e.to_string(), DIAG_LIMIT))
    }
}

impl From<ExecutionError> for PipelineError {
    fn from(e: ExecutionError) -> Self {
        match e {
            ExecutionError::Database(msg) => PipelineError::Execution(msg),
        }
    }
}

/// Location of the tabular store.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    InMemory,
    Path(PathBuf),
}

/// Executes queries against a DuckDB database.
///
/// The executor holds only the store location; every call to
/// [`QueryExecutor::execute`] opens its own scoped connection, so resource
/// release is guaranteed on success and on every error path.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    location: StoreLocation,
}

impl QueryExecutor {
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::Path(path.into()),
        }
    }

    fn connect(&self) -> Result<Connection, ExecutionError> {
        match &self.location {
            StoreLocation::InMemory => Ok(Connection::open_in_memory()?),
            StoreLocation::Path(path) => Ok(Connection::open(path)?),
        }
    }

    /// Run a query and materialize the full result.
    pub fn execute(&self, sql: &str) -> Result<ResultTable, ExecutionError> {
        let conn = self.connect()?;
        let result = run_query(&conn, sql);
        // conn dropped here on every path
        result
    }

    /// Run setup statements (tests and demos only; the pipeline itself is
    /// read-only).
    pub fn execute_batch(&self, sql: &str) -> Result<(), ExecutionError> {
        let conn = self.connect()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

fn run_query(conn: &Connection, sql: &str) -> Result<ResultTable, ExecutionError> {
    let mut stmt = conn.prepare(sql)?;

    let column_count = stmt.column_count();
    let mut columns: Vec<String> = (0..column_count)
        .map(|i| {
            stmt.column_name(i)
                .unwrap_or(&"unknown".to_string())
                .to_string()
        })
        .collect();

    let mut rows = stmt.query([])?;
    let mut result_rows = Vec::new();

    while let Some(row) = rows.next()? {
        // Some statements only report their shape once executed.
        if columns.is_empty() {
            let count = row.as_ref().column_count();
            for i in 0..count {
                columns.push(row.as_ref().column_name(i)?.to_string());
            }
        }

        let mut cells = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            cells.push(value_to_json(row.get_ref(idx)?));
        }
        result_rows.push(cells);
    }

    tracing::debug!(
        rows = result_rows.len(),
        columns = columns.len(),
        "query materialized"
    );
    Ok(ResultTable::new(columns, result_rows))
}

fn value_to_json(value: duckdb::types::ValueRef<'_>) -> serde_json::Value {
    use duckdb::types::ValueRef;

    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => serde_json::json!(i),
        ValueRef::SmallInt(i) => serde_json::json!(i),
        ValueRef::Int(i) => serde_json::json!(i),
        ValueRef::BigInt(i) => serde_json::json!(i),
        ValueRef::HugeInt(i) => serde_json::json!(i),
        ValueRef::UTinyInt(i) => serde_json::json!(i),
        ValueRef::USmallInt(i) => serde_json::json!(i),
        ValueRef::UInt(i) => serde_json::json!(i),
        ValueRef::UBigInt(i) => serde_json::json!(i),
        ValueRef::Float(f) => serde_json::json!(f),
        ValueRef::Double(f) => serde_json::json!(f),
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
        _ => serde_json::Value::String("<unsupported>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_materializes_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE spend (customer VARCHAR, total DOUBLE);
             INSERT INTO spend VALUES ('a', 15000), ('b', 7800);",
        )
        .unwrap();

        let table = run_query(&conn, "SELECT customer, total FROM spend ORDER BY total DESC")
            .unwrap();
        assert_eq!(table.columns, vec!["customer", "total"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][1], serde_json::json!(15000.0));
    }

    #[test]
    fn test_empty_result_keeps_column_names() {
        let conn = Connection::open_in_memory().unwrap();
        let table = run_query(&conn, "SELECT 1 AS x WHERE 1 = 0").unwrap();
        assert_eq!(table.columns, vec!["x"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_error_is_typed_and_bounded() {
        let executor = QueryExecutor::in_memory();
        let err = executor.execute("SELECT * FROM no_such_table").unwrap_err();
        let ExecutionError::Database(msg) = err;
        assert!(msg.chars().count() <= DIAG_LIMIT + 3);
    }

    #[test]
    fn test_connection_is_scoped_per_call() {
        // Two executes against an in-memory store see independent state.
        let executor = QueryExecutor::in_memory();
        executor.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        assert!(executor.execute("SELECT * FROM t").is_err());
    }
}
