use crate::{error::AppError, model::attendance::AttendanceRecord};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;
use utoipa::ToSchema;

const RECENT_ATTENDANCE: usize = 3;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[schema(example = 92.5)]
    pub attendance_percentage: f64,
    #[schema(example = 81.3)]
    pub academic_performance: f64,
    pub recent_attendance: Vec<AttendanceRecord>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Present days over the calendar days elapsed since the first recorded day.
pub fn attendance_percentage(present_days: usize, first: NaiveDateTime, now: NaiveDateTime) -> f64 {
    if present_days == 0 {
        return 0.0;
    }

    let elapsed_ms = (now - first).num_milliseconds() as f64;
    let total_days = (elapsed_ms / MILLIS_PER_DAY).ceil().max(1.0);

    round1((present_days as f64 / total_days * 100.0).min(100.0))
}

pub fn average_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    round1(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Attendance percentage, average mark and latest check-ins
#[utoipa::path(
    get,
    path = "/api/student/dashboard-summary/{student_id}",
    params(
        ("student_id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 500, description = "Internal server error")
    ),
    tag = "Student"
)]
pub async fn dashboard_summary(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let attendance = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_id, timestamp
        FROM attendance_records
        WHERE student_id = ?
        ORDER BY timestamp DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool.get_ref());

    let scores = sqlx::query_scalar::<_, f64>("SELECT score FROM marks WHERE student_id = ?")
        .bind(student_id)
        .fetch_all(pool.get_ref());

    // both queries run at the same time
    let (mut records, scores) = futures::try_join!(attendance, scores).map_err(|e| {
        error!(error = %e, student_id, "Failed to build dashboard summary");
        AppError::from(e)
    })?;

    let attendance_percentage = match records.last() {
        Some(first) => attendance_percentage(records.len(), first.timestamp, Utc::now().naive_utc()),
        None => 0.0,
    };

    records.truncate(RECENT_ATTENDANCE);

    Ok(HttpResponse::Ok().json(DashboardSummary {
        attendance_percentage,
        academic_performance: average_score(&scores),
        recent_attendance: records,
    }))
}
