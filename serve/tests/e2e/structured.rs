use super::common::{self, fenced};

#[tokio::test]
async fn e2e_unified_text_has_question_header() {
    let server =
        common::spawn_server(&[&fenced("SELECT course_code FROM course WHERE id = 1")]).await;

    let (status, body) = server.ask("/structured/structured", "OOP course code?").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], "RESULTS_FOUND");
    assert_eq!(body["message"], "Query executed successfully");
    assert_eq!(
        body["data"],
        "Question: OOP course code?\n\nSQL Query Results: course_code: COMP3003"
    );
}

#[tokio::test]
async fn e2e_unified_failure_is_query_error_without_driver_detail() {
    let server = common::spawn_server(&[&fenced("SELECT secret FROM nowhere")]).await;

    let (status, body) = server.ask("/structured/structured", "anything").await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "QUERY_ERROR");
    assert!(body["data"].is_null());
    let message = body["message"].as_str().unwrap();
    assert!(!message.contains("nowhere"), "leaked: {}", message);
}
