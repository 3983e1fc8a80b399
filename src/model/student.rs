use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub roll_number: String,
    pub rfid_uid: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub photo_url: Option<String>,
}
