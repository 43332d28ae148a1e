//! NL2SQL orchestrator.
//!
//! One request walks `render prompt → generate → extract → execute → {empty | format}`,
//! strictly in order. Generation and execution may fail; the first failure ends the
//! request as a [`Failure`] and the caller maps it with [`ApiResponse`]. Nothing is
//! retried.
//!
//! Modes are picked by the caller (the endpoint), never by the content of the question:
//! [`Pipeline::rows`], [`Pipeline::flattened`], [`Pipeline::unified`],
//! [`Pipeline::answer`] and [`Pipeline::timetable_url`].

mod response;

pub use response::{ApiResponse, ResponseCode, ResponseStyle, RowsResponse, TextResponse};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use crate::db::{QueryExecutor, ResultSet};
use crate::error::{CompletionError, Failure, TemplateError};
use crate::extract::extract_sql;
use crate::llm::LlmClient;
use crate::prompts::{Domain, PromptRegistry, PromptVars, SQL_STOP_SEQUENCE};

pub type Outcome<T> = Result<T, Failure>;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Column the timetable URL mode reads from the first row.
pub const TIMETABLE_URL_COLUMN: &str = "timetable_url";

impl Domain {
    /// Response naming for this domain's endpoints.
    pub fn style(&self) -> ResponseStyle {
        match self {
            Domain::Unified => ResponseStyle::Unified,
            _ => ResponseStyle::Standard,
        }
    }
}

/// Orchestrates one question through prompt, completion, extraction and execution.
///
/// Cheap to clone; every collaborator is shared. Holds no per-request state, so one
/// instance serves concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    prompts: Arc<PromptRegistry>,
    llm: Arc<dyn LlmClient>,
    executor: Arc<dyn QueryExecutor>,
    top_k: usize,
    llm_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        prompts: Arc<PromptRegistry>,
        llm: Arc<dyn LlmClient>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            prompts,
            llm,
            executor,
            top_k: DEFAULT_TOP_K,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    /// Row-limit hint rendered into `{top_k}`. Never applied to the SQL itself.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Upper bound for each completion call.
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, CompletionError> {
        match tokio::time::timeout(self.llm_timeout, self.llm.complete(prompt, stop)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.llm_timeout)),
        }
    }

    /// Renders the domain prompt, asks the model for SQL and extracts it.
    pub async fn generate_sql(&self, domain: Domain, question: &str) -> Outcome<String> {
        if question.trim().is_empty() {
            return Err(TemplateError::MissingParameter("question".to_string()).into());
        }
        let vars = PromptVars::for_query(question, self.executor.dialect(), self.top_k);
        let prompt = self.prompts.get(domain).render_query(&vars)?;
        debug!(prompt_len = prompt.len(), "prompt rendered");

        let raw = self
            .complete(&prompt, &[SQL_STOP_SEQUENCE])
            .await
            .map_err(|e| {
                warn!(error = %e, "sql generation failed");
                e
            })?;
        debug!(raw = %raw, "completion received");

        let sql = extract_sql(&raw);
        debug!(sql = %sql, "sql extracted");
        Ok(sql)
    }

    async fn run(&self, domain: Domain, question: &str) -> Outcome<(String, ResultSet)> {
        let sql = self.generate_sql(domain, question).await?;
        let rs = self.executor.execute(&sql).await.map_err(|e| {
            warn!(error = %e, sql = %sql, "query failed");
            e
        })?;
        debug!(rows = rs.len(), "query executed");
        Ok((sql, rs))
    }

    async fn non_empty(&self, domain: Domain, question: &str) -> Outcome<ResultSet> {
        let (_, rs) = self.run(domain, question).await?;
        if rs.is_empty() {
            return Err(Failure::NoResults);
        }
        Ok(rs)
    }

    /// Row-list mode: ordered row mappings, `NoResults` when empty.
    pub async fn rows(&self, domain: Domain, question: &str) -> Outcome<ResultSet> {
        self.non_empty(domain, question)
            .instrument(request_span(domain, "rows"))
            .await
    }

    /// Flattened-text mode: `column: value` lines, rows separated by a blank line.
    pub async fn flattened(&self, domain: Domain, question: &str) -> Outcome<String> {
        self.non_empty(domain, question)
            .instrument(request_span(domain, "flattened"))
            .await
            .map(|rs| rs.flatten())
    }

    /// Unified text mode: flattened rows behind a `Question: ...` header.
    pub async fn unified(&self, question: &str) -> Outcome<String> {
        let text = self
            .non_empty(Domain::Unified, question)
            .instrument(request_span(Domain::Unified, "unified"))
            .await?
            .flatten();
        Ok(format!(
            "Question: {}\n\nSQL Query Results: {}",
            question, text
        ))
    }

    /// Synthesized-answer mode: a second completion over the question, the executed SQL
    /// and the flattened result. An empty result still reaches synthesis.
    pub async fn answer(&self, domain: Domain, question: &str) -> Outcome<String> {
        async {
            let (sql, rs) = self.run(domain, question).await?;
            let vars = PromptVars::for_answer(question, sql.trim(), &rs.flatten());
            let prompt = self.prompts.get(domain).render_answer(&vars)?;
            let answer = self.complete(&prompt, &[]).await.map_err(|e| {
                warn!(error = %e, "answer synthesis failed");
                e
            })?;
            debug!(answer_len = answer.len(), "answer synthesized");
            Ok::<_, Failure>(answer.trim().to_string())
        }
        .instrument(request_span(domain, "answer"))
        .await
    }

    /// Timetable URL mode: `timetable_url` of the first row.
    pub async fn timetable_url(&self, question: &str) -> Outcome<String> {
        let rs = self
            .non_empty(Domain::TeacherTimetable, question)
            .instrument(request_span(Domain::TeacherTimetable, "timetable_url"))
            .await?;
        first_url(&rs)
    }
}

/// `timetable_url` of the first row as text.
pub(crate) fn first_url(rs: &ResultSet) -> Outcome<String> {
    match rs.first_value(TIMETABLE_URL_COLUMN) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(Failure::MissingColumn(TIMETABLE_URL_COLUMN.to_string())),
    }
}

fn request_span(domain: Domain, mode: &'static str) -> tracing::Span {
    let request_id = uuid::Uuid::new_v4();
    info_span!("nl2sql", request_id = %request_id, domain = %domain, mode = mode)
}
