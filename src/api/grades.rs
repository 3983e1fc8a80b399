use crate::{
    error::{AppError, is_foreign_key_violation},
    model::mark::Mark,
    utils::db_utils::{SqlValue, WhereClause, non_blank, parse_non_blank},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

const MAX_SCORE: f64 = 100.0;

#[derive(Deserialize, IntoParams)]
pub struct GradeFilter {
    /// Filter by student ID
    #[serde(rename = "studentId")]
    #[param(example = 7, value_type = Option<i64>)]
    pub student_id: Option<String>,
    /// Filter by subject
    #[param(example = "Mathematics")]
    pub subject: Option<String>,
    /// Filter by roll number
    #[param(example = "S001")]
    pub roll_number: Option<String>,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct GradeRow {
    #[schema(example = 1)]
    pub id: i64,
    #[serde(rename = "studentId")]
    #[schema(example = 7)]
    pub student_id: i64,
    #[serde(rename = "studentName")]
    #[schema(example = "Asha Rao")]
    pub student_name: String,
    #[schema(example = "S001")]
    pub roll_number: String,
    #[schema(example = "Mathematics")]
    pub subject: String,
    #[schema(example = 88.5)]
    pub score: f64,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub exam_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrade {
    #[schema(example = 7)]
    pub student_id: Option<i64>,
    #[schema(example = "Mathematics")]
    pub subject: Option<String>,
    #[schema(example = 88.5)]
    pub score: Option<f64>,
    /// Defaults to today
    #[schema(example = "2026-01-10", format = "date", value_type = Option<String>)]
    pub exam_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct SubjectScore {
    #[schema(example = 88.5)]
    pub score: f64,
    #[serde(rename = "examDate")]
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub exam_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct MarksBySubject {
    /// subject -> scores, newest exam first
    #[serde(rename = "marksBySubject")]
    #[schema(value_type = Object)]
    pub marks_by_subject: BTreeMap<String, Vec<SubjectScore>>,
}

/// Groups marks by subject keeping the incoming order within each subject.
pub fn group_by_subject(marks: Vec<Mark>) -> BTreeMap<String, Vec<SubjectScore>> {
    let mut grouped: BTreeMap<String, Vec<SubjectScore>> = BTreeMap::new();
    for mark in marks {
        grouped.entry(mark.subject).or_default().push(SubjectScore {
            score: mark.score,
            exam_date: mark.exam_date,
        });
    }
    grouped
}

/// Marks joined with students, filterable
#[utoipa::path(
    get,
    path = "/api/teacher/grades",
    params(GradeFilter),
    responses(
        (status = 200, description = "Grades ordered by exam date then roll number", body = [GradeRow]),
        (status = 400, description = "Malformed studentId"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Grades"
)]
pub async fn list_grades(
    pool: web::Data<SqlitePool>,
    query: web::Query<GradeFilter>,
) -> Result<HttpResponse, AppError> {
    let student_id = parse_non_blank::<i64>(query.student_id.as_deref(), "studentId")?;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut filter = WhereClause::new();
    filter
        .push_opt("m.student_id = ?", student_id.map(SqlValue::I64))
        .push_opt("m.subject = ?", non_blank(query.subject.as_deref()).map(SqlValue::Text))
        .push_opt(
            "s.roll_number = ?",
            non_blank(query.roll_number.as_deref()).map(SqlValue::Text),
        );

    let data_sql = format!(
        r#"
        SELECT m.id, s.id AS student_id, s.name AS student_name, s.roll_number,
               m.subject, m.score, m.exam_date
        FROM marks m
        JOIN students s ON s.id = m.student_id
        {}
        ORDER BY m.exam_date DESC, s.roll_number ASC
        "#,
        filter.sql()
    );
    debug!(sql = %data_sql, "Fetching grades");

    let mut data_q = sqlx::query_as::<_, GradeRow>(&data_sql);
    for arg in filter.into_values() {
        data_q = match arg {
            SqlValue::I64(v) => data_q.bind(v),
            SqlValue::Text(s) => data_q.bind(s),
        };
    }

    let grades = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch grades");
        AppError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(grades))
}

/* =========================
Teacher: record a grade
========================= */
#[utoipa::path(
    post,
    path = "/api/teacher/grades",
    request_body = CreateGrade,
    responses(
        (status = 201, description = "Grade added", body = Object, example = json!({
            "id": 12,
            "message": "Grade added successfully"
        })),
        (status = 400, description = "Missing or invalid field", body = Object, example = json!({
            "message": "Missing required fields: studentId, subject, numeric score"
        })),
        (status = 404, description = "Unknown student"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Grades"
)]
pub async fn create_grade(
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateGrade>,
) -> Result<HttpResponse, AppError> {
    let subject = payload.subject.as_deref().map(str::trim).unwrap_or_default();

    let (Some(student_id), Some(score)) = (payload.student_id, payload.score) else {
        return Err(AppError::bad_request(
            "Missing required fields: studentId, subject, numeric score",
        ));
    };
    if subject.is_empty() {
        return Err(AppError::bad_request(
            "Missing required fields: studentId, subject, numeric score",
        ));
    }
    if !(0.0..=MAX_SCORE).contains(&score) {
        return Err(AppError::bad_request("score must be between 0 and 100"));
    }

    let exam_date = payload
        .exam_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let result = sqlx::query(
        "INSERT INTO marks (student_id, subject, score, exam_date) VALUES (?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(subject)
    .bind(score)
    .bind(exam_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::not_found("Student not found")
        } else {
            error!(error = %e, student_id, "Failed to insert grade");
            e.into()
        }
    })?;

    let id = result.last_insert_rowid();
    info!(id, student_id, subject, "Grade added");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": id,
        "message": "Grade added successfully"
    })))
}

/// A student's marks grouped by subject
#[utoipa::path(
    get,
    path = "/api/student/marks/{student_id}",
    params(
        ("student_id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Marks grouped by subject", body = MarksBySubject),
        (status = 500, description = "Internal server error")
    ),
    tag = "Student"
)]
pub async fn student_marks(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let marks = sqlx::query_as::<_, Mark>(
        r#"
        SELECT id, student_id, subject, score, exam_date
        FROM marks
        WHERE student_id = ?
        ORDER BY subject, exam_date DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(MarksBySubject {
        marks_by_subject: group_by_subject(marks),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::test_utils::{body_json, seed_mark, seed_student, test_app};
    use actix_web::{http::StatusCode, test as actix_test};
    use serde_json::json;

    fn mark(subject: &str, score: f64, date: &str) -> Mark {
        Mark {
            id: 0,
            student_id: 1,
            subject: subject.to_string(),
            score,
            exam_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn grouping_keeps_row_order_per_subject() {
        let grouped = group_by_subject(vec![
            mark("Science", 70.0, "2026-02-01"),
            mark("English", 91.0, "2026-01-20"),
            mark("Science", 64.0, "2026-01-15"),
        ]);

        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["English", "Science"]);
        assert_eq!(
            grouped["Science"].iter().map(|s| s.score).collect::<Vec<_>>(),
            vec![70.0, 64.0]
        );
    }

    #[actix_web::test]
    async fn grades_filter_and_order() {
        let pool = test_pool().await;
        let asha = seed_student(&pool, "Asha Rao", "S002", "CARD1", "pw").await;
        let bilal = seed_student(&pool, "Bilal Khan", "S001", "CARD2", "pw").await;
        seed_mark(&pool, asha, "Mathematics", 88.0, "2026-01-10").await;
        seed_mark(&pool, bilal, "Mathematics", 75.0, "2026-01-10").await;
        seed_mark(&pool, asha, "Science", 69.5, "2026-01-20").await;
        let app = test_app!(pool);

        let req = actix_test::TestRequest::get().uri("/api/teacher/grades").to_request();
        let body = body_json(actix_test::call_service(&app, req).await).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["subject"], "Science");
        assert_eq!(rows[1]["roll_number"], "S001");
        assert_eq!(rows[2]["roll_number"], "S002");
        assert_eq!(rows[2]["studentName"], "Asha Rao");
        assert_eq!(rows[2]["exam_date"], "2026-01-10");

        let req = actix_test::TestRequest::get()
            .uri("/api/teacher/grades?subject=Mathematics&roll_number=S002")
            .to_request();
        let body = body_json(actix_test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["studentId"], asha);
        assert_eq!(body[0]["score"], 88.0);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/teacher/grades?studentId={bilal}&subject="))
            .to_request();
        let body = body_json(actix_test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        // empty parameters mean "no filter"
        let req = actix_test::TestRequest::get()
            .uri("/api/teacher/grades?studentId=&subject=&roll_number=")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);

        let req = actix_test::TestRequest::get()
            .uri("/api/teacher/grades?studentId=abc")
            .to_request();
        assert_eq!(
            actix_test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn teacher_adds_a_grade() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let app = test_app!(pool);

        let req = actix_test::TestRequest::post()
            .uri("/api/teacher/grades")
            .set_json(json!({"studentId": id, "subject": "English", "score": 91, "examDate": "2026-01-20"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "Grade added successfully");
        assert!(body["id"].as_i64().unwrap() > 0);

        // exam date defaults to today
        let req = actix_test::TestRequest::post()
            .uri("/api/teacher/grades")
            .set_json(json!({"studentId": id, "subject": "Art", "score": 80.5}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let date: NaiveDate = sqlx::query_scalar("SELECT exam_date FROM marks WHERE subject = 'Art'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(date, Utc::now().date_naive());
    }

    #[actix_web::test]
    async fn invalid_grades_are_rejected() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        let app = test_app!(pool);

        let cases = [
            (json!({"studentId": id, "subject": "English"}), StatusCode::BAD_REQUEST),
            (json!({"studentId": id, "subject": "  ", "score": 50}), StatusCode::BAD_REQUEST),
            (json!({"studentId": id, "subject": "English", "score": "ninety"}), StatusCode::BAD_REQUEST),
            (json!({"studentId": id, "subject": "English", "score": 140}), StatusCode::BAD_REQUEST),
            (json!({"studentId": 99, "subject": "English", "score": 50}), StatusCode::NOT_FOUND),
        ];

        for (payload, expected) in cases {
            let req = actix_test::TestRequest::post()
                .uri("/api/teacher/grades")
                .set_json(payload)
                .to_request();
            assert_eq!(actix_test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn student_marks_are_grouped_newest_first() {
        let pool = test_pool().await;
        let id = seed_student(&pool, "Asha Rao", "S001", "CARD1", "pw").await;
        seed_mark(&pool, id, "Science", 64.0, "2026-01-15").await;
        seed_mark(&pool, id, "Science", 70.0, "2026-02-01").await;
        seed_mark(&pool, id, "English", 91.0, "2026-01-20").await;
        let app = test_app!(pool);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/student/marks/{id}"))
            .to_request();
        let body = body_json(actix_test::call_service(&app, req).await).await;

        assert_eq!(
            body,
            json!({
                "marksBySubject": {
                    "English": [{"score": 91.0, "examDate": "2026-01-20"}],
                    "Science": [
                        {"score": 70.0, "examDate": "2026-02-01"},
                        {"score": 64.0, "examDate": "2026-01-15"}
                    ]
                }
            })
        );
    }
}
