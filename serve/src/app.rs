//! Axum app: state and router.
//!
//! Routes mirror the three question families. Every `POST` takes `{"question": "..."}`.
//!
//! | route | mode |
//! |---|---|
//! | `POST /teacher/json` | rows |
//! | `POST /teacher/structured` | flattened text |
//! | `POST /teacher/answer` | synthesized answer |
//! | `POST /teacher/timetable/url` | first `timetable_url` |
//! | `GET /teacher/timetable/image?question=&name=` | combined JPEG |
//! | `POST /course/json` | rows |
//! | `POST /course/structured` | flattened text |
//! | `POST /course/answer` | synthesized answer |
//! | `POST /structured/structured` | unified text |

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use text2sql::{Pipeline, Settings, SettingsError, TimetableImages};

use crate::handlers;

/// Shared state for all handlers. Both members are cheap to clone and hold no
/// per-request data.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub timetable: TimetableImages,
}

impl AppState {
    pub fn new(pipeline: Pipeline, timetable: TimetableImages) -> Self {
        Self {
            pipeline,
            timetable,
        }
    }

    /// Pipeline and timetable service over the configured chat endpoint and database.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let pipeline = settings.build_pipeline()?;
        let timetable = settings.build_timetable(pipeline.clone())?;
        Ok(Self::new(pipeline, timetable))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let teacher = Router::new()
        .route("/json", post(handlers::teacher_rows))
        .route("/structured", post(handlers::teacher_text))
        .route("/answer", post(handlers::teacher_answer))
        .route("/timetable/url", post(handlers::timetable_url))
        .route("/timetable/image", get(handlers::timetable_image));
    let course = Router::new()
        .route("/json", post(handlers::course_rows))
        .route("/structured", post(handlers::course_text))
        .route("/answer", post(handlers::course_answer));
    let structured = Router::new().route("/structured", post(handlers::unified_text));

    Router::new()
        .nest("/teacher", teacher)
        .nest("/course", course)
        .nest("/structured", structured)
        .with_state(state)
}
