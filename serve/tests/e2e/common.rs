//! Shared helpers for e2e tests: a seeded SQLite file, a mock-backed server on
//! `127.0.0.1:0`, and stub document I/O for the timetable image route.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tempfile::NamedTempFile;
use text2sql::{
    DocumentFetcher, MockLlm, PageRasterizer, Pipeline, PromptRegistry, SqliteExecutor,
    TimetableError, TimetableImages,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SCHEMA: &str = r#"
CREATE TABLE teacher (
    id INTEGER PRIMARY KEY,
    name TEXT,
    name_en TEXT,
    office_room TEXT,
    photo_url TEXT
);
CREATE TABLE teacher_info (
    id INTEGER PRIMARY KEY,
    teacher_id INTEGER REFERENCES teacher(id),
    lang TEXT,
    timetable_url TEXT
);
CREATE TABLE course (
    id INTEGER PRIMARY KEY,
    course_code TEXT,
    name_en TEXT
);
CREATE TABLE section (
    id INTEGER PRIMARY KEY,
    course_id INTEGER REFERENCES course(id),
    section_number TEXT,
    schedule TEXT,
    teachers TEXT
);

INSERT INTO teacher VALUES (1, '唐涛', 'Tao TANG', 'T4-501', 'https://files.example.edu/photo/tang.jpg');
INSERT INTO teacher VALUES (2, '李华', 'Hua LI', 'T4-502', NULL);
INSERT INTO teacher VALUES (3, '王小明', 'Xiaoming WANG', 'T3-101', NULL);

INSERT INTO teacher_info VALUES (1, 1, 'cn', 'https://files.example.edu/timetable/tang-cn.pdf');
INSERT INTO teacher_info VALUES (2, 2, 'cn', 'timetable/li-cn.pdf');
INSERT INTO teacher_info VALUES (3, 3, 'cn', NULL);

INSERT INTO course VALUES (1, 'COMP3003', 'Object Oriented Programming');
INSERT INTO course VALUES (2, 'COMP2013', 'Database Systems');

INSERT INTO section VALUES (1, 1, '1001', 'Mon 10:00-11:50', 'Dr. Tao TANG');
INSERT INTO section VALUES (2, 2, '1001', 'Wed 14:00-15:50', 'Prof. Hua LI');
"#;

/// Serves absolute URLs only; relative ones fail like an unreachable host.
struct StubFetcher;

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TimetableError> {
        if url.starts_with("https://") {
            Ok(b"%PDF-1.4 stub".to_vec())
        } else {
            Err(TimetableError::Fetch(format!("cannot fetch {}", url)))
        }
    }
}

/// One 60x40 page.
struct OnePage;

#[async_trait]
impl PageRasterizer for OnePage {
    async fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<Vec<u8>>, TimetableError> {
        let img: RgbImage = ImageBuffer::from_pixel(60, 40, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| TimetableError::Render(e.to_string()))?;
        Ok(vec![buf.into_inner()])
    }
}

/// A running server; aborted on drop.
pub struct TestServer {
    pub base_url: String,
    pub llm: Arc<MockLlm>,
    handle: JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
    _db: NamedTempFile,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs `{"question": question}` and returns (status, body).
    pub async fn ask(&self, path: &str, question: &str) -> (u16, Value) {
        let resp = reqwest::Client::new()
            .post(self.url(path))
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap();
        eprintln!("[e2e] {} -> {} {}", path, status, body);
        (status, body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seeded_db() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let conn = rusqlite::Connection::open(file.path()).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    file
}

/// Bind to a random port and serve a pipeline whose model replies `replies` in order.
pub async fn spawn_server(replies: &[&str]) -> TestServer {
    let db = seeded_db();
    let llm = Arc::new(MockLlm::with_replies(replies.iter().copied()));
    let pipeline = Pipeline::new(
        Arc::new(PromptRegistry::embedded()),
        llm.clone(),
        Arc::new(SqliteExecutor::new(db.path().to_string_lossy().to_string())),
    );
    let timetable = TimetableImages::new(pipeline.clone(), Arc::new(StubFetcher), Arc::new(OnePage));
    let state = Arc::new(serve::AppState::new(pipeline, timetable));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(serve::run_serve_on_listener(listener, state));
    TestServer {
        base_url: format!("http://{}", addr),
        llm,
        handle,
        _db: db,
    }
}

/// Wraps `sql` the way models answer.
pub fn fenced(sql: &str) -> String {
    format!("```sql\n{}\n```", sql)
}
