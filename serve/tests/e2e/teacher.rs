use serde_json::json;

use super::common::{self, fenced};

#[tokio::test]
async fn e2e_teacher_json_returns_rows() {
    let server = common::spawn_server(&[&fenced(
        "SELECT DISTINCT t.name_en, t.office_room FROM teacher t WHERE t.name_en LIKE '%Tao%' AND t.name_en LIKE '%TANG%'",
    )])
    .await;

    let (status, body) = server.ask("/teacher/json", "Where is Tao TANG's office?").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "success": true,
            "code": "RESULTS_FOUND",
            "message": "Results found.",
            "data": [{"name_en": "Tao TANG", "office_room": "T4-501"}]
        })
    );
    assert_eq!(server.llm.call_count(), 1);
}

#[tokio::test]
async fn e2e_teacher_structured_returns_flattened_text() {
    let server = common::spawn_server(&[&fenced(
        "SELECT name_en, office_room FROM teacher WHERE id = 2",
    )])
    .await;

    let (status, body) = server.ask("/teacher/structured", "Hua LI office").await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "RESULTS_FOUND");
    assert_eq!(body["data"], "name_en: Hua LI\noffice_room: T4-502");
}

#[tokio::test]
async fn e2e_teacher_answer_uses_second_completion() {
    let server = common::spawn_server(&[
        &fenced("SELECT name_en, photo_url FROM teacher WHERE id = 1"),
        "Tao TANG: ![image](https://files.example.edu/photo/tang.jpg)",
    ])
    .await;

    let (status, body) = server.ask("/teacher/answer", "Show me Tao TANG").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], "ANSWER_FOUND");
    assert_eq!(
        body["data"],
        "Tao TANG: ![image](https://files.example.edu/photo/tang.jpg)"
    );
    assert_eq!(server.llm.call_count(), 2);
}

#[tokio::test]
async fn e2e_teacher_timetable_url() {
    let server = common::spawn_server(&[&fenced(
        "SELECT DISTINCT t.name_en, ti.timetable_url FROM teacher t JOIN teacher_info ti ON t.id = ti.teacher_id WHERE t.id = 1",
    )])
    .await;

    let (status, body) = server.ask("/teacher/timetable/url", "Tao TANG timetable").await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "RESULTS_FOUND");
    assert_eq!(body["data"], "https://files.example.edu/timetable/tang-cn.pdf");
}

#[tokio::test]
async fn e2e_invalid_sql_is_error_with_empty_data() {
    let server = common::spawn_server(&[&fenced("SELECT salary FROM teacher")]).await;

    let (status, body) = server.ask("/teacher/json", "How much does Tao earn?").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "ERROR");
    assert_eq!(body["message"], "SQL Query Error.");
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn e2e_blank_question_is_400_and_skips_the_model() {
    let server = common::spawn_server(&["unused"]).await;

    let (status, body) = server.ask("/teacher/json", "  ").await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "ERROR");
    assert_eq!(server.llm.call_count(), 0);
}
