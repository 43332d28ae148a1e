//! SQLite-backed executor.
//!
//! Opens a read-only connection per query inside `spawn_blocking`, registers a
//! `regexp(pattern, text)` function so `x REGEXP '(?i)O.* O.* P.*'` predicates work, and
//! interrupts the statement when the configured upper bound elapses. Input holding more
//! than one statement is rejected rather than truncated to the first.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Batch, Connection, OpenFlags};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::{QueryExecutor, ResultSet, Row, SqlGuard};
use crate::error::QueryError;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Executes SQL against a SQLite file (or `file:` URI).
///
/// **Interaction**: Implements `QueryExecutor`; built by `Settings::build_pipeline`.
pub struct SqliteExecutor {
    target: String,
    timeout: Duration,
    guard: Option<SqlGuard>,
}

impl SqliteExecutor {
    /// `target` is a path or a `file:` URI; the file must already exist.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: DEFAULT_QUERY_TIMEOUT,
            guard: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables the single-SELECT parse check before execution.
    pub fn with_guard(mut self, guard: SqlGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

fn open(target: &str) -> Result<Connection, QueryError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(target, flags)
        .map_err(|e| QueryError::Connection(e.to_string()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| QueryError::Connection(e.to_string()))?;
    register_regexp(&conn).map_err(|e| QueryError::Connection(e.to_string()))?;
    Ok(conn)
}

fn value_text(v: ValueRef<'_>) -> Option<String> {
    match v {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// `X REGEXP Y` calls `regexp(Y, X)`. NULL on either side yields NULL. The compiled
/// pattern is cached per statement through SQLite auxiliary data.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            if matches!(ctx.get_raw(0), ValueRef::Null) {
                return Ok(None);
            }
            let Some(text) = value_text(ctx.get_raw(1)) else {
                return Ok(None);
            };
            let re = ctx.get_or_create_aux(0, |vr| -> Result<Regex, BoxError> {
                let pattern = value_text(vr).unwrap_or_default();
                Ok(Regex::new(&pattern)?)
            })?;
            Ok(Some(re.is_match(&text)))
        },
    )
}

fn to_json(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

fn run(conn: &Connection, sql: &str, params: &[String]) -> Result<ResultSet, QueryError> {
    let mut batch = Batch::new(conn, sql);
    let Some(mut stmt) = batch.next()? else {
        return Err(QueryError::Execution("empty statement".to_string()));
    };
    if batch.next()?.is_some() {
        warn!("refusing SQL with more than one statement");
        return Err(QueryError::Rejected("expected a single statement".to_string()));
    }
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = Row::new();
        for (i, name) in columns.iter().enumerate() {
            map.insert(name.clone(), to_json(row.get_ref(i)?));
        }
        out.push(map);
    }
    Ok(ResultSet { columns, rows: out })
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn execute_with_params(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<ResultSet, QueryError> {
        if let Some(guard) = &self.guard {
            guard.check(sql)?;
        }
        let target = self.target.clone();
        let conn = tokio::task::spawn_blocking(move || open(&target))
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))??;
        let interrupt = conn.get_interrupt_handle();

        let sql_owned = sql.to_string();
        let params = params.to_vec();
        let task = tokio::task::spawn_blocking(move || run(&conn, &sql_owned, &params));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => {
                let result = joined.map_err(|e| QueryError::Execution(e.to_string()))??;
                debug!(rows = result.len(), columns = result.columns.len(), "query finished");
                Ok(result)
            }
            Err(_) => {
                interrupt.interrupt();
                warn!(timeout = ?self.timeout, "query interrupted after timeout");
                Err(QueryError::Timeout(self.timeout))
            }
        }
    }
}
