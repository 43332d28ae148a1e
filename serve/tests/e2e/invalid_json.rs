use serde_json::{json, Value};

use super::common;

async fn post_raw(
    server: &common::TestServer,
    path: &str,
    content_type: &str,
    body: &str,
) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(server.url(path))
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap();
    let body = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, text));
    (status, body)
}

#[tokio::test]
async fn e2e_invalid_json_gets_error_envelope_without_calling_the_model() {
    let server = common::spawn_server(&["unused"]).await;

    let (status, body) =
        post_raw(&server, "/teacher/json", "application/json", "not valid json").await;

    assert_eq!(status, 400);
    assert_eq!(
        body,
        json!({"success": false, "code": "ERROR", "message": "Invalid request.", "data": []})
    );
    assert_eq!(server.llm.call_count(), 0);
}

#[tokio::test]
async fn e2e_wrong_shape_on_text_endpoint_has_null_data() {
    let server = common::spawn_server(&["unused"]).await;

    let (status, body) = post_raw(
        &server,
        "/course/structured",
        "application/json",
        r#"{"question": 42}"#,
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "ERROR");
    assert!(body["data"].is_null());
    assert_eq!(server.llm.call_count(), 0);
}

#[tokio::test]
async fn e2e_unified_endpoint_reports_query_error_for_bad_body() {
    let server = common::spawn_server(&["unused"]).await;

    let (status, body) = post_raw(&server, "/structured/structured", "application/json", "{").await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], "QUERY_ERROR");
    assert_eq!(body["message"], "Invalid request.");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn e2e_missing_content_type_still_gets_an_envelope() {
    let server = common::spawn_server(&["unused"]).await;

    let (status, body) = post_raw(
        &server,
        "/teacher/answer",
        "text/plain",
        r#"{"question": "who teaches OOP?"}"#,
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(server.llm.call_count(), 0);
}
