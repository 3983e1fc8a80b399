use crate::{
    error::{AppError, is_foreign_key_violation},
    model::leave_request::{LeaveRequest, LeaveStatus},
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    #[schema(example = 7)]
    pub student_id: Option<i64>,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose UTC date is used
    #[serde(default, deserialize_with = "date_or_timestamp")]
    #[schema(example = "2026-01-01", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_or_timestamp")]
    #[schema(example = "2026-01-03T00:00:00.000Z", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
    /// Reference to a supporting document stored elsewhere
    #[schema(example = "medical-note.pdf")]
    pub document_url: Option<String>,
}

fn date_or_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::from_str(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct PendingLeave {
    #[schema(example = 1)]
    pub id: i64,
    #[serde(rename = "studentName")]
    #[schema(example = "Asha Rao")]
    pub student_name: String,
    #[serde(rename = "startDate")]
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Fever")]
    pub reason: String,
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(example = "medical-note.pdf", nullable = true)]
    pub document_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandleLeave {
    #[schema(example = 1)]
    pub leave_id: Option<i64>,
    #[schema(example = "Approved")]
    pub status: Option<String>,
}

/* =========================
Student: apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/student/apply-leave",
    request_body = ApplyLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave application submitted successfully."
        })),
        (status = 400, description = "Missing field or bad date range", body = Object, example = json!({
            "message": "All fields are required"
        })),
        (status = 404, description = "Unknown student"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    pool: web::Data<SqlitePool>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, AppError> {
    let reason = payload.reason.as_deref().map(str::trim).unwrap_or_default();

    let (Some(student_id), Some(start_date), Some(end_date)) =
        (payload.student_id, payload.start_date, payload.end_date)
    else {
        return Err(AppError::bad_request("All fields are required"));
    };
    if reason.is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    // validate dates
    if start_date > end_date {
        return Err(AppError::bad_request("startDate cannot be after endDate"));
    }

    let document_url = payload
        .document_url
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (student_id, start_date, end_date, reason, document_url)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(start_date)
    .bind(end_date)
    .bind(reason)
    .bind(document_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::not_found("Student not found")
        } else {
            error!(error = %e, student_id, "Failed to create leave request");
            e.into()
        }
    })?;

    info!(student_id, %start_date, %end_date, "Leave request submitted");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave application submitted successfully."
    })))
}

/// A student's own leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/student/leaves/{student_id}",
    params(
        ("student_id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Leave history", body = [LeaveRequest]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn student_leaves(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let student_id = path.into_inner();

    let leaves = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, student_id, start_date, end_date, reason, document_url, status, created_at
        FROM leave_requests
        WHERE student_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// Pending leave requests awaiting a decision
#[utoipa::path(
    get,
    path = "/api/teacher/leaves",
    responses(
        (status = 200, description = "Pending requests, newest first", body = [PendingLeave]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn pending_leaves(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let leaves = sqlx::query_as::<_, PendingLeave>(
        r#"
        SELECT lr.id, s.name AS student_name, lr.start_date, lr.end_date,
               lr.reason, lr.status, lr.document_url
        FROM leave_requests lr
        JOIN students s ON s.id = lr.student_id
        WHERE lr.status = ?
        ORDER BY lr.id DESC
        "#,
    )
    .bind(LeaveStatus::Pending.as_ref())
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Teacher: approve or reject a pending leave
========================= */
#[utoipa::path(
    post,
    path = "/api/teacher/handle-leave",
    request_body = HandleLeave,
    responses(
        (status = 200, description = "Leave status updated", body = Object, example = json!({
            "message": "Leave status updated successfully."
        })),
        (status = 400, description = "Invalid status", body = Object, example = json!({
            "message": "Invalid status"
        })),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        })),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "message": "Leave request already Approved"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn handle_leave(
    pool: web::Data<SqlitePool>,
    payload: web::Json<HandleLeave>,
) -> Result<HttpResponse, AppError> {
    let status = payload
        .status
        .as_deref()
        .and_then(|s| LeaveStatus::from_str(s).ok())
        .filter(LeaveStatus::is_decision)
        .ok_or_else(|| AppError::bad_request("Invalid status"))?;

    let leave_id = payload
        .leave_id
        .ok_or_else(|| AppError::bad_request("leaveId is required"))?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(status.as_ref())
    .bind(leave_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Handle leave failed");
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM leave_requests WHERE id = ?")
                .bind(leave_id)
                .fetch_optional(pool.get_ref())
                .await?;

        return Err(match current {
            None => AppError::not_found("Leave request not found"),
            Some(current) => AppError::conflict(format!("Leave request already {current}")),
        });
    }

    info!(leave_id, %status, "Leave request handled");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave status updated successfully."
    })))
}
