//! Command implementations behind the `text2sql` binary.
//!
//! [`ask`] runs one pipeline mode and returns the same envelope the HTTP server sends;
//! [`run_sql`] skips generation and executes a raw completion; [`write_timetable`] renders
//! a teacher's timetable to a file.

use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use serde_json::Value;
use text2sql::{
    extract_sql, Domain, Pipeline, QueryError, QueryExecutor, Row, RowsResponse, TextResponse,
    TimetableError, TimetableImages, TimetableQuery,
};
use thiserror::Error;

/// Output mode for `ask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Row list (`data` is an array of objects).
    Rows,
    /// Flattened `column: value` text; unified header for the unified domain.
    Text,
    /// Second completion turns the result into prose.
    Answer,
    /// First row's `timetable_url` (teacher timetable prompts).
    Url,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("no SQL in input")]
    EmptyInput,
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Timetable(#[from] TimetableError),
    #[error("write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs `question` through `pipeline` in `mode` and returns the response envelope.
pub async fn ask(pipeline: &Pipeline, domain: Domain, mode: Mode, question: &str) -> Value {
    let style = domain.style();
    match mode {
        Mode::Rows => {
            let outcome = pipeline.rows(domain, question).await;
            serde_json::json!(RowsResponse::rows(&outcome, style))
        }
        Mode::Text if domain == Domain::Unified => {
            serde_json::json!(TextResponse::text(&pipeline.unified(question).await, style))
        }
        Mode::Text => {
            serde_json::json!(TextResponse::text(&pipeline.flattened(domain, question).await, style))
        }
        Mode::Answer => {
            serde_json::json!(TextResponse::answer(&pipeline.answer(domain, question).await, style))
        }
        Mode::Url => {
            serde_json::json!(TextResponse::timetable_url(&pipeline.timetable_url(question).await))
        }
    }
}

/// `arg` when given and not `-`, else all of stdin.
pub fn read_input(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Extracts SQL from a raw completion the way the pipeline does, then executes it.
pub async fn run_sql(executor: &dyn QueryExecutor, raw: &str) -> Result<Vec<Row>, CliError> {
    let sql = extract_sql(raw);
    if sql.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(executor.execute(&sql).await?.into_rows())
}

/// Renders the timetable for `query` and writes the JPEG to `out`. Returns the byte count.
pub async fn write_timetable(
    timetable: &TimetableImages,
    query: &TimetableQuery,
    out: &Path,
) -> Result<usize, CliError> {
    let jpeg = timetable.render(query).await?;
    tokio::fs::write(out, &jpeg)
        .await
        .map_err(|source| CliError::Write {
            path: out.display().to_string(),
            source,
        })?;
    Ok(jpeg.len())
}
