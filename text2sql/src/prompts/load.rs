//! Load domain prompts from a directory of YAML files over the embedded defaults.
//!
//! **Canonical source**: default prompt text lives in `text2sql/prompts/*.yaml`; the files
//! are embedded at compile time and used when no `PROMPTS_DIR` or directory is present.

use std::path::{Path, PathBuf};

use super::{Domain, DomainPrompts, DomainPromptsFile, PromptRegistry};

macro_rules! embed_prompt_yaml {
    ($name:literal) => {
        include_str!(concat!("../../prompts/", $name))
    };
}
const EMBED_TEACHER: &str = embed_prompt_yaml!("teacher.yaml");
const EMBED_TEACHER_TIMETABLE: &str = embed_prompt_yaml!("teacher_timetable.yaml");
const EMBED_COURSE: &str = embed_prompt_yaml!("course.yaml");
const EMBED_UNIFIED: &str = embed_prompt_yaml!("unified.yaml");

/// Default directory name when `PROMPTS_DIR` is not set.
const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// Error when loading prompts from a directory (missing dir, unreadable file, invalid YAML).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
}

fn embedded_source(domain: Domain) -> &'static str {
    match domain {
        Domain::Teacher => EMBED_TEACHER,
        Domain::TeacherTimetable => EMBED_TEACHER_TIMETABLE,
        Domain::Course => EMBED_COURSE,
        Domain::Unified => EMBED_UNIFIED,
    }
}

fn embedded_prompts(domain: Domain) -> DomainPrompts {
    let file: DomainPromptsFile =
        serde_yaml::from_str(embedded_source(domain)).unwrap_or_default();
    DomainPrompts {
        query_prompt: String::new(),
        answer_prompt: String::new(),
        schema_fragment: String::new(),
    }
    .merged(file)
}

pub(super) fn from_embedded() -> PromptRegistry {
    PromptRegistry {
        teacher: embedded_prompts(Domain::Teacher),
        teacher_timetable: embedded_prompts(Domain::TeacherTimetable),
        course: embedded_prompts(Domain::Course),
        unified: embedded_prompts(Domain::Unified),
    }
}

/// `dir` if given, else `PROMPTS_DIR`, else `./prompts`.
fn prompts_dir(dir: Option<&Path>) -> PathBuf {
    dir.map(PathBuf::from).unwrap_or_else(|| {
        std::env::var("PROMPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROMPTS_DIR))
    })
}

fn read_domain_file(dir: &Path, domain: Domain) -> Result<Option<DomainPromptsFile>, LoadError> {
    let path = dir.join(domain.file_name());
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(LoadError::ReadFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    let file = serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(file))
}

/// Loads prompts from a directory: each `<domain>.yaml` present overrides the fields it
/// sets; missing files and missing keys keep the embedded defaults.
///
/// Only fails when the directory itself is missing or a present file cannot be read/parsed.
pub fn load(dir: Option<&Path>) -> Result<PromptRegistry, LoadError> {
    let base = prompts_dir(dir);
    if !base.is_dir() {
        return Err(LoadError::DirNotFound(base.display().to_string()));
    }
    let mut registry = from_embedded();
    for domain in Domain::ALL {
        if let Some(file) = read_domain_file(&base, domain)? {
            let slot = registry.get_mut(domain);
            *slot = slot.clone().merged(file);
            tracing::debug!(domain = %domain, dir = %base.display(), "prompt override loaded");
        }
    }
    Ok(registry)
}

/// Like [`load`], but falls back to the embedded defaults when the directory is absent.
/// A present-but-broken file is still reported, since silently ignoring it would hide
/// a misconfiguration.
pub fn load_or_default(dir: Option<&Path>) -> Result<PromptRegistry, LoadError> {
    match load(dir) {
        Err(LoadError::DirNotFound(_)) => Ok(from_embedded()),
        other => other,
    }
}
