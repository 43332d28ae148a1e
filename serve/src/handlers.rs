//! Request handlers. Each one runs a single pipeline mode and wraps the outcome in the
//! `{ success, code, message, data }` envelope. A body that is not a JSON question gets
//! the same envelope with status 400 and never reaches the pipeline.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use text2sql::{ApiResponse, Domain, Failure, RowsResponse, TextResponse, TimetableQuery};
use tracing::warn;

use crate::app::AppState;

/// `{"question": "..."}`. A missing field is treated as blank and rejected by the pipeline.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuestionRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimetableParams {
    pub question: Option<String>,
    pub name: Option<String>,
}

fn status_of<T>(outcome: &Result<T, Failure>) -> StatusCode {
    let code = outcome.as_ref().err().map_or(200, Failure::http_status);
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn reply<T, D: Serialize>(outcome: &Result<T, Failure>, body: ApiResponse<D>) -> Response {
    (status_of(outcome), Json(body)).into_response()
}

type Body = Result<Json<QuestionRequest>, JsonRejection>;

fn question(body: Body) -> Result<String, Failure> {
    match body {
        Ok(Json(req)) => Ok(req.question),
        Err(rejection) => {
            warn!(error = %rejection, "request body rejected");
            Err(Failure::InvalidRequest(rejection.body_text()))
        }
    }
}

async fn rows(state: &AppState, domain: Domain, body: Body) -> Response {
    let outcome = match question(body) {
        Ok(q) => state.pipeline.rows(domain, &q).await,
        Err(f) => Err(f),
    };
    reply(&outcome, RowsResponse::rows(&outcome, domain.style()))
}

async fn text(state: &AppState, domain: Domain, body: Body) -> Response {
    let outcome = match question(body) {
        Ok(q) => state.pipeline.flattened(domain, &q).await,
        Err(f) => Err(f),
    };
    reply(&outcome, TextResponse::text(&outcome, domain.style()))
}

async fn answer(state: &AppState, domain: Domain, body: Body) -> Response {
    let outcome = match question(body) {
        Ok(q) => state.pipeline.answer(domain, &q).await,
        Err(f) => Err(f),
    };
    reply(&outcome, TextResponse::answer(&outcome, domain.style()))
}

pub(crate) async fn teacher_rows(State(state): State<Arc<AppState>>, body: Body) -> Response {
    rows(&state, Domain::Teacher, body).await
}

pub(crate) async fn teacher_text(State(state): State<Arc<AppState>>, body: Body) -> Response {
    text(&state, Domain::Teacher, body).await
}

pub(crate) async fn teacher_answer(State(state): State<Arc<AppState>>, body: Body) -> Response {
    answer(&state, Domain::Teacher, body).await
}

pub(crate) async fn course_rows(State(state): State<Arc<AppState>>, body: Body) -> Response {
    rows(&state, Domain::Course, body).await
}

pub(crate) async fn course_text(State(state): State<Arc<AppState>>, body: Body) -> Response {
    text(&state, Domain::Course, body).await
}

pub(crate) async fn course_answer(State(state): State<Arc<AppState>>, body: Body) -> Response {
    answer(&state, Domain::Course, body).await
}

pub(crate) async fn unified_text(State(state): State<Arc<AppState>>, body: Body) -> Response {
    let outcome = match question(body) {
        Ok(q) => state.pipeline.unified(&q).await,
        Err(f) => Err(f),
    };
    reply(&outcome, TextResponse::text(&outcome, Domain::Unified.style()))
}

pub(crate) async fn timetable_url(State(state): State<Arc<AppState>>, body: Body) -> Response {
    let outcome = match question(body) {
        Ok(q) => state.pipeline.timetable_url(&q).await,
        Err(f) => Err(f),
    };
    reply(&outcome, TextResponse::timetable_url(&outcome))
}

/// `image/jpeg` on success; `{"detail": ...}` with 400, 404 or 500 otherwise.
pub(crate) async fn timetable_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimetableParams>,
) -> Response {
    let query = TimetableQuery {
        question: params.question,
        name: params.name,
    };
    match state.timetable.render(&query).await {
        Ok(jpeg) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Err(e) => {
            warn!(error = %e, "timetable image failed");
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "detail": e.public_message() }))).into_response()
        }
    }
}
