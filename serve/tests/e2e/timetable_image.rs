use image::ImageFormat;
use serde_json::Value;

use super::common;

async fn get(server: &common::TestServer, query: &[(&str, &str)]) -> reqwest::Response {
    reqwest::Client::new()
        .get(server.url("/teacher/timetable/image"))
        .query(query)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn e2e_image_by_name_is_jpeg() {
    let server = common::spawn_server(&["unused"]).await;

    let resp = get(&server, &[("name", "Tao TANG")]).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("image/jpeg")
    );
    let bytes = resp.bytes().await.unwrap();
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
    assert_eq!((img.width(), img.height()), (60, 40));
    assert_eq!(server.llm.call_count(), 0);
}

#[tokio::test]
async fn e2e_image_without_parameters_is_400() {
    let server = common::spawn_server(&["unused"]).await;

    let resp = get(&server, &[]).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Either question or name is required.");
}

#[tokio::test]
async fn e2e_image_without_timetable_is_404() {
    let server = common::spawn_server(&["unused"]).await;

    let resp = get(&server, &[("name", "Xiaoming WANG")]).await;

    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn e2e_image_failed_download_is_404() {
    let server = common::spawn_server(&["unused"]).await;

    let resp = get(&server, &[("name", "Hua LI")]).await;

    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Failed to download the PDF.");
}
