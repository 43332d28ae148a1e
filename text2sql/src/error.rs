//! Error types for each pipeline stage.
//!
//! Stage errors ([`TemplateError`], [`CompletionError`], [`QueryError`]) carry the detail
//! that goes to the log. [`Failure`] is what the orchestrator hands back to callers; its
//! `Display` is safe to log but only [`Failure::public_message`] is ever sent to a client.

use std::time::Duration;

use thiserror::Error;

/// Prompt rendering failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{placeholder}` in the template has no value in the supplied parameters.
    #[error("missing template parameter: {0}")]
    MissingParameter(String),
    /// Domain key does not name one of the supported domains.
    #[error("unknown prompt domain: {0}")]
    UnknownDomain(String),
}

/// The completion provider could not produce text.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport or API failure (unreachable host, non-2xx, bad request).
    #[error("completion request failed: {0}")]
    Request(String),
    /// The provider answered but without any usable choice.
    #[error("completion response had no content")]
    EmptyResponse,
    /// The call exceeded the configured upper bound.
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
}

/// Executing SQL against the store failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Could not open or configure a connection.
    #[error("database connection failed: {0}")]
    Connection(String),
    /// Driver-level failure: syntax error, unknown column, type mismatch.
    #[error("query execution failed: {0}")]
    Execution(String),
    /// The optional pre-execution check refused the statement.
    #[error("query rejected: {0}")]
    Rejected(String),
    /// The statement was interrupted after the configured upper bound.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

impl From<rusqlite::Error> for QueryError {
    fn from(e: rusqlite::Error) -> Self {
        QueryError::Execution(e.to_string())
    }
}

/// Terminal failure of one pipeline request.
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The request body could not be read as a question (bad JSON, wrong shape).
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The query ran and returned zero rows.
    #[error("no results found")]
    NoResults,
    /// The query ran but did not select a column this mode needs (e.g. `timetable_url`).
    #[error("result has no usable `{0}` column")]
    MissingColumn(String),
}

impl Failure {
    /// Client-side failures (bad body or template parameters) versus everything else.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Failure::Template(_) | Failure::InvalidRequest(_))
    }

    /// Generic text returned to callers; never includes driver or provider detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Failure::Template(_) | Failure::InvalidRequest(_) => "Invalid request.",
            Failure::Completion(_) => "Query generation failed.",
            Failure::Query(_) | Failure::MissingColumn(_) => "SQL Query Error.",
            Failure::NoResults => "No results found.",
        }
    }
}
