//! HTTP e2e tests: each test spawns the server on `127.0.0.1:0` with a scripted model.
//! Run with `--nocapture` to see `[e2e]` response logs.

mod common;

mod course;
mod invalid_json;
mod structured;
mod teacher;
mod timetable_image;
