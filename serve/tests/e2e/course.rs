use serde_json::json;

use super::common::{self, fenced};

#[tokio::test]
async fn e2e_course_json_rows() {
    let server = common::spawn_server(&[&fenced(
        "SELECT course.course_code, section.schedule FROM course JOIN section ON course.id = section.course_id WHERE course.course_code = 'COMP2013'",
    )])
    .await;

    let (status, body) = server.ask("/course/json", "When is COMP2013?").await;

    assert_eq!(status, 200);
    assert_eq!(
        body["data"],
        json!([{"course_code": "COMP2013", "schedule": "Wed 14:00-15:50"}])
    );
}

#[tokio::test]
async fn e2e_course_empty_result_is_no_results_found() {
    let server = common::spawn_server(&[&fenced(
        "SELECT name_en FROM course WHERE course_code = 'MATH9999'",
    )])
    .await;

    let (status, body) = server.ask("/course/json", "What is MATH9999?").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NO_RESULTS_FOUND");
    assert_eq!(body["message"], "No results found.");
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn e2e_course_structured_failure_has_null_data() {
    let server = common::spawn_server(&[&fenced("SELEC name_en FROM course")]).await;

    let (status, body) = server.ask("/course/structured", "Which courses?").await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "ERROR");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn e2e_course_answer() {
    let server = common::spawn_server(&[
        &fenced("SELECT name_en FROM course WHERE course_code = 'COMP3003'"),
        "COMP3003 is Object Oriented Programming.",
    ])
    .await;

    let (_, body) = server.ask("/course/answer", "What is COMP3003?").await;

    assert_eq!(body["code"], "ANSWER_FOUND");
    assert_eq!(body["message"], "Answer found.");
    assert_eq!(body["data"], "COMP3003 is Object Oriented Programming.");
}
