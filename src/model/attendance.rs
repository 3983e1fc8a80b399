use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 7)]
    pub student_id: i64,
    #[schema(example = "2026-01-05T08:47:12", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
}

/// Presence for a given day. Present means a record exists for that day.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// Time written for records a teacher enters by hand.
pub fn manual_timestamp(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(9, 0, 0).unwrap_or_default()
}
