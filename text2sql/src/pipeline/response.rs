//! Wire envelope `{ success, code, message, data }` and failure mapping.

use serde::Serialize;

use crate::db::{ResultSet, Row};
use crate::error::Failure;

/// Response code sent to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    ResultsFound,
    AnswerFound,
    NoResultsFound,
    Error,
    QueryError,
}

/// Naming used by an endpoint family. The unified endpoint reports failures as
/// `QUERY_ERROR`; the teacher and course endpoints use `ERROR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStyle {
    Standard,
    Unified,
}

impl ResponseStyle {
    fn error_code(self) -> ResponseCode {
        match self {
            ResponseStyle::Standard => ResponseCode::Error,
            ResponseStyle::Unified => ResponseCode::QueryError,
        }
    }

    fn found_message(self) -> &'static str {
        match self {
            ResponseStyle::Standard => "Results found.",
            ResponseStyle::Unified => "Query executed successfully",
        }
    }

    fn empty_message(self) -> &'static str {
        match self {
            ResponseStyle::Standard => "No results found.",
            ResponseStyle::Unified => "No results found",
        }
    }
}

impl Failure {
    /// Code this failure is reported under for `style`.
    pub fn code(&self, style: ResponseStyle) -> ResponseCode {
        match self {
            Failure::NoResults => ResponseCode::NoResultsFound,
            _ => style.error_code(),
        }
    }

    /// HTTP status: 400 for rejected input, 200 otherwise (failure is in the body).
    pub fn http_status(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            200
        }
    }

    fn message(&self, style: ResponseStyle) -> &'static str {
        match self {
            Failure::NoResults => style.empty_message(),
            other => other.public_message(),
        }
    }
}

/// `{ success, code, message, data }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: ResponseCode,
    pub message: String,
    pub data: T,
}

pub type RowsResponse = ApiResponse<Vec<Row>>;
pub type TextResponse = ApiResponse<Option<String>>;

impl<T> ApiResponse<T> {
    fn ok(code: ResponseCode, message: &str, data: T) -> Self {
        Self {
            success: true,
            code,
            message: message.to_string(),
            data,
        }
    }

    fn failed(failure: &Failure, style: ResponseStyle, data: T) -> Self {
        Self {
            success: false,
            code: failure.code(style),
            message: failure.message(style).to_string(),
            data,
        }
    }
}

impl ApiResponse<Vec<Row>> {
    /// Row-list mode. Failures carry an empty array.
    pub fn rows(outcome: &Result<ResultSet, Failure>, style: ResponseStyle) -> Self {
        match outcome {
            Ok(rs) => Self::ok(ResponseCode::ResultsFound, style.found_message(), rs.rows.clone()),
            Err(f) => Self::failed(f, style, Vec::new()),
        }
    }
}

impl ApiResponse<Option<String>> {
    /// Flattened-text mode. Failures carry `null`.
    pub fn text(outcome: &Result<String, Failure>, style: ResponseStyle) -> Self {
        match outcome {
            Ok(s) => Self::ok(ResponseCode::ResultsFound, style.found_message(), Some(s.clone())),
            Err(f) => Self::failed(f, style, None),
        }
    }

    /// Synthesized-answer mode.
    pub fn answer(outcome: &Result<String, Failure>, style: ResponseStyle) -> Self {
        match outcome {
            Ok(s) => Self::ok(ResponseCode::AnswerFound, "Answer found.", Some(s.clone())),
            Err(f) => Self::failed(f, style, None),
        }
    }

    /// Timetable URL mode: an empty result reports `""` rather than `null`.
    pub fn timetable_url(outcome: &Result<String, Failure>) -> Self {
        match outcome {
            Err(Failure::NoResults) => {
                Self::failed(&Failure::NoResults, ResponseStyle::Standard, Some(String::new()))
            }
            other => Self::text(other, ResponseStyle::Standard),
        }
    }
}
