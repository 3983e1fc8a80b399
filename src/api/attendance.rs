use crate::{
    error::{AppError, is_foreign_key_violation, is_unique_violation},
    model::{
        attendance::{AttendanceRecord, AttendanceStatus, manual_timestamp},
        student::Student,
    },
    utils::db_utils::parse_non_blank,
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct KioskScan {
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct KioskResponse {
    #[schema(example = "Welcome, Asha Rao! Attendance marked.")]
    pub message: String,
    #[serde(rename = "photoUrl")]
    #[schema(example = "/images/s001.jpg", nullable = true)]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct RosterQuery {
    /// Day to report, defaults to today (UTC)
    #[param(example = "2026-01-05")]
    pub date: Option<String>,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct RosterEntry {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "S001")]
    pub roll_number: String,
    #[schema(example = "Present")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAttendance {
    #[schema(example = 1)]
    pub student_id: Option<i64>,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    #[schema(example = "Present")]
    pub status: Option<String>,
}

/* =========================
Kiosk: mark today's attendance by RFID card
========================= */
#[utoipa::path(
    post,
    path = "/api/mark-attendance",
    request_body = KioskScan,
    responses(
        (status = 200, description = "Attendance marked", body = KioskResponse),
        (status = 400, description = "RFID UID missing", body = Object, example = json!({
            "message": "RFID UID is required"
        })),
        (status = 404, description = "No student holds this card", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 409, description = "Already marked today", body = Object, example = json!({
            "message": "Attendance already marked for today"
        })),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    pool: web::Data<SqlitePool>,
    payload: web::Json<KioskScan>,
) -> Result<HttpResponse, AppError> {
    let rfid_uid = payload
        .rfid_uid
        .as_deref()
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| AppError::bad_request("RFID UID is required"))?;

    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE rfid_uid = ?")
        .bind(rfid_uid)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| {
            info!(rfid_uid, "Unknown card scanned");
            AppError::not_found("Student not found")
        })?;

    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records (student_id, timestamp, attend_date)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(student.id)
    .bind(now)
    .bind(now.date())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            info!(student_id = student.id, "Attendance marked at kiosk");
            Ok(HttpResponse::Ok().json(KioskResponse {
                message: format!("Welcome, {}! Attendance marked.", student.name),
                photo_url: student.photo_url,
            }))
        }
        // one record per student per day
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::conflict("Attendance already marked for today"))
        }
        Err(e) => {
            error!(error = %e, student_id = student.id, "Kiosk check-in failed");
            Err(e.into())
        }
    }
}

/// A student's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/student/attendance/{student_id}",
    params(
        ("student_id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Attendance records", body = [AttendanceRecord]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Student"
)]
pub async fn student_attendance(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_id, timestamp
        FROM attendance_records
        WHERE student_id = ?
        ORDER BY timestamp DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Every student with Present/Absent for one day
#[utoipa::path(
    get,
    path = "/api/teacher/attendance",
    params(RosterQuery),
    responses(
        (status = 200, description = "Roster ordered by roll number", body = [RosterEntry]),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher"
)]
pub async fn daily_roster(
    pool: web::Data<SqlitePool>,
    query: web::Query<RosterQuery>,
) -> Result<HttpResponse, AppError> {
    let date = parse_non_blank::<NaiveDate>(query.date.as_deref(), "date")?
        .unwrap_or_else(|| Utc::now().date_naive());
    debug!(%date, "Building attendance roster");

    let roster = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT s.id, s.name, s.roll_number,
               CASE WHEN a.id IS NULL THEN 'Absent' ELSE 'Present' END AS status
        FROM students s
        LEFT JOIN attendance_records a
               ON a.student_id = s.id AND a.attend_date = ?
        ORDER BY s.roll_number
        "#,
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(roster))
}

/* =========================
Teacher: set Present/Absent for a day
========================= */
#[utoipa::path(
    post,
    path = "/api/teacher/mark-attendance",
    request_body = SetAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = Object, example = json!({
            "message": "Attendance updated successfully"
        })),
        (status = 400, description = "Missing field or invalid status", body = Object, example = json!({
            "message": "Invalid status. Must be Present or Absent."
        })),
        (status = 404, description = "Unknown student", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher"
)]
pub async fn set_attendance(
    pool: web::Data<SqlitePool>,
    payload: web::Json<SetAttendance>,
) -> Result<HttpResponse, AppError> {
    let (Some(student_id), Some(date), Some(status)) =
        (payload.student_id, payload.date, payload.status.as_deref())
    else {
        return Err(AppError::bad_request(
            "Missing required fields: studentId, date, or status",
        ));
    };

    let status = AttendanceStatus::from_str(status)
        .map_err(|_| AppError::bad_request("Invalid status. Must be Present or Absent."))?;

    match status {
        AttendanceStatus::Present => {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance_records (student_id, timestamp, attend_date)
                VALUES (?, ?, ?)
                ON CONFLICT (student_id, attend_date) DO NOTHING
                "#,
            )
            .bind(student_id)
            .bind(manual_timestamp(date))
            .bind(date)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::not_found("Student not found")
                } else {
                    error!(error = %e, student_id, %date, "Marking present failed");
                    e.into()
                }
            })?;

            if result.rows_affected() == 0 {
                return Ok(HttpResponse::Ok().json(serde_json::json!({
                    "message": "Attendance already marked as Present"
                })));
            }
        }
        AttendanceStatus::Absent => {
            sqlx::query("DELETE FROM attendance_records WHERE student_id = ? AND attend_date = ?")
                .bind(student_id)
                .bind(date)
                .execute(pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, student_id, %date, "Marking absent failed");
                    AppError::from(e)
                })?;
        }
    }

    info!(student_id, %date, %status, "Attendance updated by teacher");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use crate::db::test_pool;
    use crate::test_utils::{body_json, peer, seed_attendance, seed_student, test_app};
    use actix_web::{http::StatusCode, test};
    use chrono::Utc;
    use serde_json::json;

    #[actix_web::test]
    async fn kiosk_marks_once_per_day() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let app = test_app!(pool);

        let scan = || {
            test::TestRequest::post()
                .uri("/api/mark-attendance")
                .peer_addr(peer())
                .set_json(json!({"rfid_uid": "CARD1"}))
                .to_request()
        };

        let resp = test::call_service(&app, scan()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Welcome, Asha Rao! Attendance marked.");
        assert_eq!(body["photoUrl"], "/images/s001.jpg");

        let resp = test::call_service(&app, scan()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["message"], "Attendance already marked for today");

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_records WHERE student_id = ? AND attend_date = ?",
        )
        .bind(id)
        .bind(Utc::now().date_naive())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn kiosk_rejects_missing_and_unknown_cards() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/mark-attendance")
            .peer_addr(peer())
            .set_json(json!({"rfid_uid": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "RFID UID is required");

        let req = test::TestRequest::post()
            .uri("/api/mark-attendance")
            .peer_addr(peer())
            .set_json(json!({"rfid_uid": "NOPE"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["message"], "Student not found");
    }

    #[actix_web::test]
    async fn history_is_newest_first() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        seed_attendance(&pool, id, "2026-01-05 08:30:00").await;
        seed_attendance(&pool, id, "2026-01-07 08:45:00").await;
        seed_attendance(&pool, id, "2026-01-06 08:40:00").await;
        let app = test_app!(pool);

        let req = test::TestRequest::get()
            .uri(&format!("/api/student/attendance/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        let stamps: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["timestamp"].as_str().unwrap())
            .collect();
        assert_eq!(
            stamps,
            vec!["2026-01-07T08:45:00", "2026-01-06T08:40:00", "2026-01-05T08:30:00"]
        );
    }

    #[actix_web::test]
    async fn roster_reports_presence_for_the_requested_day() {
        let pool = test_pool().await;
        let asha = seed_student(&pool, "Asha Rao", "S002", "CARD1", "pw").await;
        seed_student(&pool, "Bilal Khan", "S001", "CARD2", "pw").await;
        seed_attendance(&pool, asha, "2026-01-05 08:30:00").await;
        let app = test_app!(pool);

        let req = test::TestRequest::get()
            .uri("/api/teacher/attendance?date=2026-01-05")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;

        assert_eq!(
            body,
            json!([
                {"id": 2, "name": "Bilal Khan", "roll_number": "S001", "status": "Absent"},
                {"id": 1, "name": "Asha Rao", "roll_number": "S002", "status": "Present"},
            ])
        );

        let req = test::TestRequest::get()
            .uri("/api/teacher/attendance?date=2026-01-06")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert!(body.as_array().unwrap().iter().all(|s| s["status"] == "Absent"));
    }

    #[actix_web::test]
    async fn empty_roster_date_means_today() {
        let pool = test_pool().await;
        let asha = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        seed_attendance(&pool, asha, &now).await;
        let app = test_app!(pool);

        let req = test::TestRequest::get()
            .uri("/api/teacher/attendance?date=")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await[0]["status"], "Present");
    }

    #[actix_web::test]
    async fn teacher_marking_is_idempotent() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let app = test_app!(pool);

        let mark = |status: &str| {
            test::TestRequest::post()
                .uri("/api/teacher/mark-attendance")
                .set_json(json!({"studentId": id, "date": "2026-01-05", "status": status}))
                .to_request()
        };

        let resp = test::call_service(&app, mark("Present")).await;
        assert_eq!(body_json(resp).await["message"], "Attendance updated successfully");

        let resp = test::call_service(&app, mark("Present")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], "Attendance already marked as Present");

        let stamp: String = sqlx::query_scalar("SELECT timestamp FROM attendance_records WHERE student_id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stamp, "2026-01-05 09:00:00");

        let resp = test::call_service(&app, mark("Absent")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, mark("Absent")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[actix_web::test]
    async fn manual_attendance_shares_the_same_rules() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let app = test_app!(pool);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/teacher/manual-attendance")
                .set_json(json!({"studentId": id, "date": "2026-01-05", "status": "Present"}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn teacher_marking_validates_input() {
        let pool = test_pool().await;
        let app = test_app!(pool);

        let req = test::TestRequest::post()
            .uri("/api/teacher/mark-attendance")
            .set_json(json!({"studentId": 1, "date": "2026-01-05"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/teacher/mark-attendance")
            .set_json(json!({"studentId": 1, "date": "2026-01-05", "status": "Late"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["message"],
            "Invalid status. Must be Present or Absent."
        );

        let req = test::TestRequest::post()
            .uri("/api/teacher/mark-attendance")
            .set_json(json!({"studentId": 42, "date": "2026-01-05", "status": "Present"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
