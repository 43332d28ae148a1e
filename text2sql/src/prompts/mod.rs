//! Prompt template registry: one template set per query domain.
//!
//! Each [`Domain`] maps to an immutable [`DomainPrompts`] (query prompt, answer prompt,
//! schema fragment). Default text lives in `text2sql/prompts/*.yaml`, embedded at compile
//! time; a directory of YAML files can override any field (see [`load`]).
//!
//! Templates use `{name}` placeholders. [`render`] substitutes in a single pass and fails
//! with [`TemplateError::MissingParameter`] for any placeholder without a value, so a
//! rendered prompt never contains an unresolved placeholder.

mod load;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::TemplateError;

pub use load::{load, load_or_default, LoadError};

/// Stop sequence used when generating SQL; keeps the model from echoing another
/// `SQLQuery:` turn after its answer.
pub const SQL_STOP_SEQUENCE: &str = "\nSQLQuery:";

/// Query domain. Closed set: adding a domain means adding a YAML file and a match arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Teacher profile lookups (teacher + teacher_info).
    Teacher,
    /// Teacher timetable URL lookups.
    TeacherTimetable,
    /// Course and section lookups.
    Course,
    /// Any question over all four tables.
    Unified,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Teacher,
        Domain::TeacherTimetable,
        Domain::Course,
        Domain::Unified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Teacher => "teacher",
            Domain::TeacherTimetable => "teacher-timetable",
            Domain::Course => "course",
            Domain::Unified => "unified",
        }
    }

    /// YAML file name holding this domain's templates.
    pub(crate) fn file_name(&self) -> &'static str {
        match self {
            Domain::Teacher => "teacher.yaml",
            Domain::TeacherTimetable => "teacher_timetable.yaml",
            Domain::Course => "course.yaml",
            Domain::Unified => "unified.yaml",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "teacher" => Ok(Domain::Teacher),
            "teacher-timetable" | "teacher_timetable" | "timetable" => Ok(Domain::TeacherTimetable),
            "course" => Ok(Domain::Course),
            "unified" | "structured" => Ok(Domain::Unified),
            _ => Err(TemplateError::UnknownDomain(s.to_string())),
        }
    }
}

/// Per-file YAML shape for `prompts/<domain>.yaml`. All keys optional; missing keys keep
/// the embedded default.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct DomainPromptsFile {
    pub query_prompt: Option<String>,
    pub answer_prompt: Option<String>,
    pub schema: Option<String>,
}

/// Templates for one domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainPrompts {
    /// SQL-generation template (`{question}`, `{dialect}`, `{top_k}`, `{schema}`).
    pub query_prompt: String,
    /// Answer-synthesis template (`{question}`, `{query}`, `{result}`).
    pub answer_prompt: String,
    /// Table descriptions substituted for `{schema}`.
    pub schema_fragment: String,
}

impl DomainPrompts {
    /// Applies the fields present in `file` over `self`.
    fn merged(mut self, file: DomainPromptsFile) -> Self {
        if let Some(s) = file.query_prompt {
            self.query_prompt = s;
        }
        if let Some(s) = file.answer_prompt {
            self.answer_prompt = s;
        }
        if let Some(s) = file.schema {
            self.schema_fragment = s;
        }
        self
    }

    /// Renders the SQL-generation prompt. `{schema}` is always supplied from this domain.
    pub fn render_query(&self, vars: &PromptVars) -> Result<String, TemplateError> {
        let vars = vars.clone().with("schema", self.schema_fragment.clone());
        render(&self.query_prompt, &vars)
    }

    /// Renders the answer-synthesis prompt.
    pub fn render_answer(&self, vars: &PromptVars) -> Result<String, TemplateError> {
        render(&self.answer_prompt, vars)
    }
}

/// All domain templates. Immutable after construction; share behind `Arc`.
#[derive(Clone, Debug)]
pub struct PromptRegistry {
    teacher: DomainPrompts,
    teacher_timetable: DomainPrompts,
    course: DomainPrompts,
    unified: DomainPrompts,
}

impl PromptRegistry {
    /// Registry built from the embedded YAML only.
    pub fn embedded() -> Self {
        load::from_embedded()
    }

    /// Directory overrides over the embedded defaults; see [`load_or_default`].
    pub fn load(dir: Option<&std::path::Path>) -> Result<Self, LoadError> {
        load::load(dir)
    }

    /// Embedded defaults when the prompts directory is absent.
    pub fn load_or_default(dir: Option<&std::path::Path>) -> Result<Self, LoadError> {
        load::load_or_default(dir)
    }

    pub fn get(&self, domain: Domain) -> &DomainPrompts {
        match domain {
            Domain::Teacher => &self.teacher,
            Domain::TeacherTimetable => &self.teacher_timetable,
            Domain::Course => &self.course,
            Domain::Unified => &self.unified,
        }
    }

    fn get_mut(&mut self, domain: Domain) -> &mut DomainPrompts {
        match domain {
            Domain::Teacher => &mut self.teacher,
            Domain::TeacherTimetable => &mut self.teacher_timetable,
            Domain::Course => &mut self.course,
            Domain::Unified => &mut self.unified,
        }
    }
}

/// Named values for template placeholders.
#[derive(Clone, Debug, Default)]
pub struct PromptVars {
    values: BTreeMap<String, String>,
}

impl PromptVars {
    /// Variables for SQL generation: question, dialect and row-limit hint.
    pub fn for_query(question: &str, dialect: &str, top_k: usize) -> Self {
        Self::default()
            .with("question", question)
            .with("dialect", dialect)
            .with("top_k", top_k.to_string())
    }

    /// Variables for answer synthesis: question, executed SQL and formatted result.
    pub fn for_answer(question: &str, query: &str, result: &str) -> Self {
        Self::default()
            .with("question", question)
            .with("query", query)
            .with("result", result)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"))
}

/// Substitutes every `{name}` in `template` with its value from `vars`.
///
/// Single pass: substituted values are not scanned again, so a question that itself
/// contains `{dialect}` is inserted verbatim.
pub fn render(template: &str, vars: &PromptVars) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_re().captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = &caps[1];
        let value = vars
            .get(name)
            .ok_or_else(|| TemplateError::MissingParameter(name.to_string()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
