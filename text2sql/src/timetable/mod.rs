//! Teacher timetable lookup and image rendering.
//!
//! A timetable is found either from a free-text question (through the pipeline's
//! teacher-timetable domain) or from a teacher name. The name path never reaches the
//! model: the name is split on whitespace and every component is bound as a parameter,
//! so nothing in it can change the statement.
//!
//! [`TimetableImages::render`] then downloads the document, rasterizes each page and
//! stacks them into one JPEG.

mod fetch;
mod render;

pub use fetch::{DocumentFetcher, ReqwestFetcher, DEFAULT_FETCH_TIMEOUT};
pub use render::{combine_pages, PageRasterizer, PdftoppmRasterizer, DEFAULT_DPI, DEFAULT_RENDER_TIMEOUT};

use std::sync::Arc;

use thiserror::Error;
use tracing::{info_span, warn, Instrument};

use crate::error::Failure;
use crate::pipeline::{first_url, Pipeline};
use crate::prompts::Domain;

/// `teacher_info.lang` used by the name lookup unless configured otherwise.
pub const DEFAULT_TIMETABLE_LANG: &str = "cn";

const NAME_LOOKUP_LIMIT: usize = 5;

/// Timetable image request failure.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Neither a question nor a name was supplied.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The lookup ran but found no timetable.
    #[error("not found: {0}")]
    NotFound(String),
    /// The lookup itself failed (generation or query).
    #[error("timetable lookup failed: {0}")]
    Lookup(#[source] Failure),
    /// Downloading the document failed.
    #[error("timetable download failed: {0}")]
    Fetch(String),
    /// Rasterizing or encoding failed.
    #[error("timetable rendering failed: {0}")]
    Render(String),
}

impl TimetableError {
    pub fn http_status(&self) -> u16 {
        match self {
            TimetableError::BadRequest(_) => 400,
            TimetableError::NotFound(_) | TimetableError::Lookup(_) | TimetableError::Fetch(_) => {
                404
            }
            TimetableError::Render(_) => 500,
        }
    }

    /// Text returned to callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            TimetableError::BadRequest(_) => "Either question or name is required.",
            TimetableError::NotFound(_) => "No results found.",
            TimetableError::Lookup(_) => "SQL Query Error.",
            TimetableError::Fetch(_) => "Failed to download the PDF.",
            TimetableError::Render(_) => "Failed to render the timetable.",
        }
    }
}

/// Which lookup to run. An empty or blank field counts as absent; `name` wins when both
/// are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimetableQuery {
    pub question: Option<String>,
    pub name: Option<String>,
}

impl TimetableQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            question: None,
            name: Some(name.into()),
        }
    }

    pub fn by_question(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            name: None,
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parameterized name lookup: each whitespace-separated component must match
/// `name_en` or `name`; all components are AND-joined. Returns `None` for a blank name.
///
/// Parameters are `%component%` for each component, followed by `lang`.
pub fn name_lookup_query(name: &str, lang: &str) -> Option<(String, Vec<String>)> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    let conditions = (1..=tokens.len())
        .map(|i| format!("(t.name_en LIKE ?{i} OR t.name LIKE ?{i})"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!(
        "SELECT t.id AS teacher_id, ti.id AS info_id, t.name, t.name_en, ti.timetable_url \
         FROM teacher t JOIN teacher_info ti ON t.id = ti.teacher_id \
         WHERE ({}) AND ti.lang = ?{} LIMIT {};",
        conditions,
        tokens.len() + 1,
        NAME_LOOKUP_LIMIT
    );
    let mut params: Vec<String> = tokens.iter().map(|t| format!("%{}%", t)).collect();
    params.push(lang.to_string());
    Some((sql, params))
}

/// Timetable image service: lookup, download, rasterize, combine.
///
/// **Interaction**: Shares the `Pipeline` (and its executor) with the text endpoints.
#[derive(Clone)]
pub struct TimetableImages {
    pipeline: Pipeline,
    fetcher: Arc<dyn DocumentFetcher>,
    rasterizer: Arc<dyn PageRasterizer>,
    lang: String,
}

impl TimetableImages {
    pub fn new(
        pipeline: Pipeline,
        fetcher: Arc<dyn DocumentFetcher>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            pipeline,
            fetcher,
            rasterizer,
            lang: DEFAULT_TIMETABLE_LANG.to_string(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Resolves the timetable URL for `query`.
    pub async fn lookup_url(&self, query: &TimetableQuery) -> Result<String, TimetableError> {
        if let Some(name) = present(&query.name) {
            let span = info_span!("timetable_lookup", path = "name");
            return self.lookup_by_name(name).instrument(span).await;
        }
        if let Some(question) = present(&query.question) {
            return match self.pipeline.rows(Domain::TeacherTimetable, question).await {
                Ok(rs) => first_url(&rs).map_err(|f| TimetableError::NotFound(f.to_string())),
                Err(Failure::NoResults) => {
                    Err(TimetableError::NotFound("no matching teacher".to_string()))
                }
                Err(f) if f.is_client_error() => Err(TimetableError::BadRequest(f.to_string())),
                Err(f) => Err(TimetableError::Lookup(f)),
            };
        }
        Err(TimetableError::BadRequest(
            "either question or name is required".to_string(),
        ))
    }

    async fn lookup_by_name(&self, name: &str) -> Result<String, TimetableError> {
        let (sql, params) = name_lookup_query(name, &self.lang).ok_or_else(|| {
            TimetableError::BadRequest("either question or name is required".to_string())
        })?;
        let rs = self
            .pipeline
            .executor()
            .execute_with_params(&sql, &params)
            .await
            .map_err(|e| {
                warn!(error = %e, "name lookup failed");
                TimetableError::Lookup(e.into())
            })?;
        if rs.is_empty() {
            return Err(TimetableError::NotFound("no matching teacher".to_string()));
        }
        first_url(&rs).map_err(|f| TimetableError::NotFound(f.to_string()))
    }

    /// Looks up the timetable and returns it as one JPEG.
    pub async fn render(&self, query: &TimetableQuery) -> Result<Vec<u8>, TimetableError> {
        let url = self.lookup_url(query).await?;
        let pdf = self.fetcher.fetch(&url).await?;
        let pages = self.rasterizer.rasterize(&pdf).await?;
        tokio::task::spawn_blocking(move || combine_pages(&pages))
            .await
            .map_err(|e| TimetableError::Render(e.to_string()))?
    }
}
