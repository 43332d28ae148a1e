//! Shared fixtures: a seeded SQLite database and a mock-backed pipeline.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::NamedTempFile;
use text2sql::{MockLlm, Pipeline, PromptRegistry, SqliteExecutor};

pub const SCHEMA: &str = r#"
CREATE TABLE teacher (
    id INTEGER PRIMARY KEY,
    name TEXT,
    name_en TEXT,
    email TEXT,
    gender TEXT,
    title TEXT,
    phone TEXT,
    phone_short TEXT,
    office_room TEXT,
    position TEXT,
    photo_url TEXT
);
CREATE TABLE teacher_info (
    id INTEGER PRIMARY KEY,
    teacher_id INTEGER REFERENCES teacher(id),
    lang TEXT,
    timetable_name TEXT,
    timetable_url TEXT,
    admin_title TEXT,
    academic_title TEXT,
    academic TEXT,
    education TEXT,
    special_honor TEXT
);
CREATE TABLE course (
    id INTEGER PRIMARY KEY,
    course_code TEXT,
    name_en TEXT,
    units INTEGER,
    curriculum_type TEXT,
    elective_type TEXT,
    offering_faculty TEXT,
    offering_programme TEXT,
    description TEXT,
    prerequisites TEXT
);
CREATE TABLE section (
    id INTEGER PRIMARY KEY,
    course_id INTEGER REFERENCES course(id),
    section_number TEXT,
    classroom TEXT,
    schedule TEXT,
    hours INTEGER,
    remarks TEXT,
    teachers TEXT
);
"#;

pub const SEED: &str = r#"
INSERT INTO teacher VALUES (1, '唐涛', 'Tao TANG', 'taotang@uic.edu.cn', 'M', 'Dr.', '3620000', '0000', 'T4-501', 'Associate Professor', 'https://files.example.edu/photo/tang.jpg');
INSERT INTO teacher VALUES (2, '李华', 'Hua LI', 'huali@uic.edu.cn', 'F', 'Prof.', '3620001', '0001', 'T4-502', 'Professor', NULL);
INSERT INTO teacher VALUES (3, '王小明', 'Xiaoming WANG', 'xmwang@uic.edu.cn', 'M', 'Dr.', '3620002', '0002', 'T3-101', 'Lecturer', NULL);

INSERT INTO teacher_info VALUES (1, 1, 'cn', '唐涛课表', 'https://files.example.edu/timetable/tang-cn.pdf', NULL, 'Associate Professor', 'Databases', 'PhD', NULL);
INSERT INTO teacher_info VALUES (2, 1, 'en', 'Tao TANG timetable', 'https://files.example.edu/timetable/tang-en.pdf', NULL, 'Associate Professor', 'Databases', 'PhD', NULL);
INSERT INTO teacher_info VALUES (3, 2, 'cn', '李华课表', 'timetable/li-cn.pdf', 'Dean', 'Professor', 'Machine Learning', 'PhD', NULL);
INSERT INTO teacher_info VALUES (4, 3, 'cn', '王小明课表', NULL, NULL, 'Lecturer', 'Networks', 'MSc', NULL);

INSERT INTO course VALUES (1, 'COMP3003', 'Object Oriented Programming', 3, 'MR', NULL, 'FST', 'CST', 'Classes and objects.', 'COMP1001');
INSERT INTO course VALUES (2, 'COMP2013', 'Database Systems', 3, 'MR', NULL, 'FST', 'CST', 'Relational databases.', NULL);
INSERT INTO course VALUES (3, 'COMP1001', 'Introduction to Computer Science', 3, 'MR', NULL, 'FST', 'CST', 'Basics.', NULL);

INSERT INTO section VALUES (1, 1, '1001', 'T4-301', 'Mon 10:00-11:50', 2, NULL, 'Dr. Tao TANG');
INSERT INTO section VALUES (2, 2, '1001', 'T3-201', 'Wed 14:00-15:50', 2, NULL, 'Prof. Hua LI');
INSERT INTO section VALUES (3, 2, '1002', 'T3-202', 'Thu 08:00-09:50', 2, NULL, 'Dr. Xiaoming WANG');
INSERT INTO section VALUES (4, 3, '1001', 'T2-101', 'Fri 10:00-11:50', 2, NULL, 'Dr. Tao TANG');
"#;

/// Seeded database file; keep the handle alive for the test's duration.
pub fn seeded_db() -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp db");
    let conn = rusqlite::Connection::open(file.path()).expect("open temp db");
    conn.execute_batch(SCHEMA).expect("schema");
    conn.execute_batch(SEED).expect("seed");
    file
}

pub fn executor(db: &NamedTempFile) -> SqliteExecutor {
    SqliteExecutor::new(db.path().to_string_lossy().to_string())
}

/// Pipeline over the embedded prompts, `db` and a mock replying `replies` in order.
pub fn pipeline(db: &NamedTempFile, replies: &[&str]) -> (Pipeline, Arc<MockLlm>) {
    let llm = Arc::new(MockLlm::with_replies(replies.iter().copied()));
    let pipeline = Pipeline::new(
        Arc::new(PromptRegistry::embedded()),
        llm.clone(),
        Arc::new(executor(db)),
    );
    (pipeline, llm)
}

/// Wraps `sql` the way models answer.
pub fn fenced(sql: &str) -> String {
    format!("Here is the query:\n```sql\n{}\n```", sql)
}

/// Number of rows in `table`, read through a fresh connection.
pub fn count(db: &NamedTempFile, table: &str) -> i64 {
    let conn = rusqlite::Connection::open(db.path()).expect("open temp db");
    conn.query_row(&format!("SELECT count(*) FROM {}", table), [], |r| r.get(0))
        .expect("count")
}
