use crate::{
    auth::password::{PasswordCheck, check_password, hash_password},
    error::AppError,
    model::role::Role,
    models::{CredentialsSql, LoginReqDto, LoginResponse, SessionUser},
};
use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};

/// Login for students (roll number) and teachers (username)
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid role or empty credentials", body = Object, example = json!({
            "message": "Invalid role"
        })),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid credentials"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, user),
    fields(role = %user.role, username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let role = Role::from_str(user.role.trim()).map_err(|_| AppError::bad_request("Invalid role"))?;
    let username = user.username.trim();

    if username.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::bad_request("Username and password are required"));
    }

    // 2️⃣ Fetch user
    debug!("Fetching user from database");

    let sql = format!(
        "SELECT id, name, password FROM {} WHERE {} = ?",
        role.table(),
        role.login_column()
    );

    let db_user = sqlx::query_as::<_, CredentialsSql>(&sql)
        .bind(username)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| {
            info!("Invalid credentials: user not found");
            AppError::Unauthorized("Invalid credentials".into())
        })?;

    // 3️⃣ Verify password
    match check_password(&user.password, &db_user.password) {
        PasswordCheck::Valid => debug!("Password verified"),
        PasswordCheck::ValidLegacy => {
            warn!(user_id = db_user.id, "Plaintext password found, upgrading to argon2");
            upgrade_password(pool.get_ref(), role, db_user.id, &user.password).await;
        }
        PasswordCheck::Invalid => {
            info!("Invalid credentials: password mismatch");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    }

    info!(user_id = db_user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        user: SessionUser {
            id: db_user.id,
            name: db_user.name,
            role,
        },
    }))
}

/// Replaces a plaintext password with its hash (non-fatal)
async fn upgrade_password(pool: &SqlitePool, role: Role, user_id: i64, password: &str) {
    let hashed = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, user_id, "Failed to hash password");
            return;
        }
    };

    let sql = format!("UPDATE {} SET password = ? WHERE id = ?", role.table());

    if let Err(e) = sqlx::query(&sql)
        .bind(hashed)
        .bind(user_id)
        .execute(pool)
        .await
    {
        // intentionally not failing login
        error!(error = %e, user_id, "Failed to upgrade password hash");
    }
}
