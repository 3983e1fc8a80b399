use crate::auth::password::hash_password;
use actix_web::{body::MessageBody, dev::ServiceResponse, test};
use sqlx::SqlitePool;
use std::net::SocketAddr;

/// Full application wired to `$pool`, same routes as production.
macro_rules! test_app {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .configure(|cfg| {
                    crate::routes::configure(cfg, &crate::config::Config::for_tests())
                }),
        )
        .await
    };
}
pub(crate) use test_app;

/// Rate limited routes key on the peer address.
pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

pub async fn body_json<B: MessageBody>(resp: ServiceResponse<B>) -> serde_json::Value {
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

pub async fn seed_student(
    pool: &SqlitePool,
    name: &str,
    roll_number: &str,
    rfid_uid: &str,
    password: &str,
) -> i64 {
    sqlx::query(
        "INSERT INTO students (name, roll_number, rfid_uid, password, photo_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(roll_number)
    .bind(rfid_uid)
    .bind(hash_password(password).unwrap())
    .bind(format!("/images/{}.jpg", roll_number.to_lowercase()))
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn seed_teacher(pool: &SqlitePool, name: &str, username: &str, password: &str) -> i64 {
    sqlx::query("INSERT INTO teachers (name, username, password) VALUES (?, ?, ?)")
        .bind(name)
        .bind(username)
        .bind(hash_password(password).unwrap())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn seed_attendance(pool: &SqlitePool, student_id: i64, timestamp: &str) {
    sqlx::query(
        "INSERT INTO attendance_records (student_id, timestamp, attend_date) VALUES (?, ?, date(?))",
    )
    .bind(student_id)
    .bind(timestamp)
    .bind(timestamp)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_mark(pool: &SqlitePool, student_id: i64, subject: &str, score: f64, exam_date: &str) {
    sqlx::query("INSERT INTO marks (student_id, subject, score, exam_date) VALUES (?, ?, ?, ?)")
        .bind(student_id)
        .bind(subject)
        .bind(score)
        .bind(exam_date)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_leave(pool: &SqlitePool, student_id: i64, status: &str) -> i64 {
    sqlx::query(
        "INSERT INTO leave_requests (student_id, start_date, end_date, reason, status) \
         VALUES (?, '2026-02-02', '2026-02-03', 'Family function', ?)",
    )
    .bind(student_id)
    .bind(status)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}
