use crate::model::role::Role;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "student")]
    pub role: String,
    /// roll number for students, username for teachers
    #[schema(example = "S001")]
    pub username: String,
    #[schema(example = "pass123")]
    pub password: String,
}

#[derive(FromRow)]
pub struct CredentialsSql {
    pub id: i64,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub user: SessionUser,
}
