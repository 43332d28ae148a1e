//! Optional pre-execution check: the generated text must parse as exactly one query.
//!
//! Off by default. The executor still runs on a read-only connection either way; this
//! only turns multi-statement or non-SELECT output into a typed rejection before it
//! reaches the driver.

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::error::QueryError;

/// Single-SELECT parse check.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlGuard;

impl SqlGuard {
    pub fn new() -> Self {
        Self
    }

    /// Accepts `sql` when it parses as one query statement (SELECT, WITH, set operations).
    ///
    /// SQLite syntax is tried first, then MySQL (which knows `REGEXP`), then generic SQL.
    pub fn check(&self, sql: &str) -> Result<(), QueryError> {
        let statements = parse_any(sql).map_err(QueryError::Rejected)?;
        match statements.as_slice() {
            [Statement::Query(_)] => Ok(()),
            [] => Err(QueryError::Rejected("empty statement".to_string())),
            [_] => Err(QueryError::Rejected(
                "only SELECT statements are allowed".to_string(),
            )),
            many => Err(QueryError::Rejected(format!(
                "expected one statement, got {}",
                many.len()
            ))),
        }
    }
}

fn parse_any(sql: &str) -> Result<Vec<Statement>, String> {
    let dialects: [&dyn Dialect; 3] = [&SQLiteDialect {}, &MySqlDialect {}, &GenericDialect {}];
    let mut last_err = String::new();
    for dialect in dialects {
        match Parser::parse_sql(dialect, sql) {
            Ok(statements) => return Ok(statements),
            Err(e) => last_err = e.to_string(),
        }
    }
    Err(format!("failed to parse SQL: {}", last_err))
}
