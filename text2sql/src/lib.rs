//! # text2sql
//!
//! Natural-language questions about university courses and teachers, answered by
//! generating SQL with an LLM and running it against the course/teacher database.
//!
//! ## Flow
//!
//! `render prompt → generate → extract → execute → {empty | format}`. Every stage is a
//! small, swappable piece:
//!
//! - [`prompts`]: [`PromptRegistry`] with one template set per [`Domain`] (teacher,
//!   teacher-timetable, course, unified); strict placeholder rendering ([`render`]).
//! - [`llm`]: [`LlmClient`] trait, OpenAI-compatible [`ChatOpenAI`], scripted [`MockLlm`].
//!   Stop sequences are enforced client-side ([`enforce_stop`]).
//! - [`extract`]: [`extract_sql`]; the last ```` ```sql ```` block wins.
//! - [`db`]: [`QueryExecutor`] trait and [`SqliteExecutor`] (read-only, per-query
//!   connection, `REGEXP`, timeout); optional [`SqlGuard`].
//! - [`pipeline`]: [`Pipeline`] with row-list, flattened-text, unified, answer and
//!   timetable-URL modes; [`ApiResponse`] envelopes.
//! - [`timetable`]: parameterized name lookup ([`name_lookup_query`]) and
//!   [`TimetableImages`] (download, rasterize, stack into one JPEG).
//! - [`settings`]: [`Settings`] from the environment; builds the pieces above.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use text2sql::{Domain, MockLlm, Pipeline, PromptRegistry, SqliteExecutor};
//!
//! # async fn run() {
//! let pipeline = Pipeline::new(
//!     Arc::new(PromptRegistry::embedded()),
//!     Arc::new(MockLlm::with_reply("```sql\nSELECT name_en FROM teacher;\n```")),
//!     Arc::new(SqliteExecutor::new("uicinfocenter.db")),
//! );
//! let rows = pipeline.rows(Domain::Teacher, "Who teaches databases?").await;
//! # }
//! ```

pub mod db;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod settings;
pub mod timetable;

pub use db::{QueryExecutor, ResultSet, Row, SqlGuard, SqliteExecutor};
pub use error::{CompletionError, Failure, QueryError, TemplateError};
pub use extract::extract_sql;
pub use llm::{enforce_stop, ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use pipeline::{
    ApiResponse, Outcome, Pipeline, ResponseCode, ResponseStyle, RowsResponse, TextResponse,
};
pub use prompts::{render, Domain, DomainPrompts, PromptRegistry, PromptVars, SQL_STOP_SEQUENCE};
pub use settings::{Settings, SettingsError};
pub use timetable::{
    combine_pages, name_lookup_query, DocumentFetcher, PageRasterizer, PdftoppmRasterizer,
    ReqwestFetcher, TimetableError, TimetableImages, TimetableQuery,
};
