//! Query execution against the course/teacher store.
//!
//! [`QueryExecutor`] runs exactly the SQL it is given (no LIMIT injection, no rewriting)
//! and returns a [`ResultSet`] whose columns follow SELECT order and whose rows follow
//! database order. [`SqliteExecutor`] is the shipped implementation; [`SqlGuard`] is an
//! optional pre-execution check.

mod guard;
mod sqlite;

pub use guard::SqlGuard;
pub use sqlite::SqliteExecutor;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::QueryError;

/// One result row: column name to value, in SELECT order.
pub type Row = serde_json::Map<String, Value>;

/// Ordered rows returned by one query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Column names as reported by the statement.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in the first row, if both exist.
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.rows.first().and_then(|r| r.get(column))
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Text form used for answer synthesis and the text endpoints: `column: value` lines
    /// per row, rows separated by one blank line. Empty set flattens to `""`.
    pub fn flatten(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Runs SQL against the relational store.
///
/// Each call acquires its own connection and releases it when the query finishes.
/// Implementations must not alter the statement.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Dialect name rendered into the generation prompt (e.g. `sqlite`).
    fn dialect(&self) -> &str;

    /// Executes `sql` verbatim.
    async fn execute(&self, sql: &str) -> Result<ResultSet, QueryError> {
        self.execute_with_params(sql, &[]).await
    }

    /// Executes `sql` with positional parameters bound as text.
    async fn execute_with_params(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<ResultSet, QueryError>;
}
