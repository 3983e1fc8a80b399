use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mark {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub score: f64,
    pub exam_date: NaiveDate,
}
