//! Typed runtime settings read from the environment.
//!
//! Binaries call `config::load_and_apply("text2sql", None)` first so `.env` and
//! `~/.config/text2sql/config.toml` values are visible here. Unset or unparsable values
//! fall back to their defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use thiserror::Error;

use crate::db::{QueryExecutor, SqlGuard, SqliteExecutor};
use crate::llm::{ChatOpenAI, LlmClient};
use crate::pipeline::{Pipeline, DEFAULT_TOP_K};
use crate::prompts::{LoadError, PromptRegistry};
use crate::timetable::{
    PdftoppmRasterizer, ReqwestFetcher, TimetableError, TimetableImages, DEFAULT_TIMETABLE_LANG,
};

pub const DEFAULT_DATABASE: &str = "uicinfocenter.db";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3278";

/// Building a component from settings failed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Prompts(#[from] LoadError),
    #[error(transparent)]
    Timetable(#[from] TimetableError),
}

/// Runtime settings, one field per environment variable.
#[derive(Clone, Debug)]
pub struct Settings {
    /// SQLite path or `file:` URI (`TEXT2SQL_DATABASE`).
    pub database: String,
    pub top_k: usize,
    pub llm_timeout: Duration,
    pub query_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Upper bound for one `pdftoppm` run (`TEXT2SQL_RENDER_TIMEOUT_SECS`).
    pub render_timeout: Duration,
    /// Single-SELECT parse check before execution (`TEXT2SQL_VALIDATE_SQL`).
    pub validate_sql: bool,
    pub timetable_lang: String,
    pub document_base_url: Option<String>,
    pub pdftoppm: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub prompts_dir: Option<PathBuf>,
    pub addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup` (key to value). Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parse = |key: &str| -> Option<u64> { get(key).and_then(|v| u64::from_str(v.trim()).ok()) };
        let secs = |key: &str, default: u64| Duration::from_secs(parse(key).unwrap_or(default));

        Self {
            database: get("TEXT2SQL_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            top_k: parse("TEXT2SQL_TOP_K")
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_TOP_K),
            llm_timeout: secs("TEXT2SQL_LLM_TIMEOUT_SECS", 60),
            query_timeout: secs("TEXT2SQL_QUERY_TIMEOUT_SECS", 30),
            fetch_timeout: secs("TEXT2SQL_FETCH_TIMEOUT_SECS", 30),
            render_timeout: secs("TEXT2SQL_RENDER_TIMEOUT_SECS", 60),
            validate_sql: get("TEXT2SQL_VALIDATE_SQL")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
            timetable_lang: get("TEXT2SQL_TIMETABLE_LANG")
                .unwrap_or_else(|| DEFAULT_TIMETABLE_LANG.to_string()),
            document_base_url: get("TEXT2SQL_DOCUMENT_BASE_URL"),
            pdftoppm: get("TEXT2SQL_PDFTOPPM").unwrap_or_else(|| "pdftoppm".to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .or_else(|| get("OPENAI_API_BASE"))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            prompts_dir: get("PROMPTS_DIR").map(PathBuf::from),
            addr: get("TEXT2SQL_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        }
    }

    pub fn build_prompts(&self) -> Result<PromptRegistry, SettingsError> {
        Ok(PromptRegistry::load_or_default(self.prompts_dir.as_deref())?)
    }

    pub fn build_llm(&self) -> ChatOpenAI {
        let mut config = OpenAIConfig::new().with_api_base(self.openai_base_url.trim_end_matches('/'));
        if let Some(key) = &self.openai_api_key {
            config = config.with_api_key(key);
        }
        ChatOpenAI::with_config(config, self.openai_model.clone())
    }

    pub fn build_executor(&self) -> SqliteExecutor {
        let executor = SqliteExecutor::new(self.database.clone()).with_timeout(self.query_timeout);
        if self.validate_sql {
            executor.with_guard(SqlGuard::new())
        } else {
            executor
        }
    }

    /// Pipeline over the configured prompts, chat endpoint and database.
    pub fn build_pipeline(&self) -> Result<Pipeline, SettingsError> {
        let llm: Arc<dyn LlmClient> = Arc::new(self.build_llm());
        self.build_pipeline_with(llm)
    }

    /// Same as [`Settings::build_pipeline`] with a caller-supplied completion provider.
    pub fn build_pipeline_with(&self, llm: Arc<dyn LlmClient>) -> Result<Pipeline, SettingsError> {
        let executor: Arc<dyn QueryExecutor> = Arc::new(self.build_executor());
        Ok(
            Pipeline::new(Arc::new(self.build_prompts()?), llm, executor)
                .with_top_k(self.top_k)
                .with_llm_timeout(self.llm_timeout),
        )
    }

    pub fn build_timetable(&self, pipeline: Pipeline) -> Result<TimetableImages, SettingsError> {
        let fetcher = ReqwestFetcher::new(self.fetch_timeout)?
            .with_base_url(self.document_base_url.clone());
        Ok(TimetableImages::new(
            pipeline,
            Arc::new(fetcher),
            Arc::new(
                PdftoppmRasterizer::new(self.pdftoppm.clone()).with_timeout(self.render_timeout),
            ),
        )
        .with_lang(self.timetable_lang.clone()))
    }
}
