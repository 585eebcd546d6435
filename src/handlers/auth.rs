// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, LoginResponse, User, UserStatus},
    utils::{hash::verify_password, jwt::sign_jwt},
};

const BAD_CREDENTIALS: &str = "Invalid credentials or account frozen";

/// Authenticates a user and returns a signed token.
///
/// Unknown account, wrong password and FROZEN status all produce the same 401.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, account, password_hash, role, status, real_name, created_at
        FROM users
        WHERE account = ?
        "#,
    )
    .bind(&payload.account)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::AuthError(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
    }

    if user.status != UserStatus::Active {
        tracing::info!(user_id = %user.id, "login refused for frozen account");
        return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
    }

    let token = sign_jwt(&user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(LoginResponse {
        id: user.id,
        account: user.account,
        role: user.role,
        name: user.real_name,
        token,
        token_type: "Bearer",
    }))
}
