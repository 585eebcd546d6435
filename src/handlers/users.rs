// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        audit_log::AuditAction,
        user::{CreateUserRequest, UpdateUserRequest, User, validate_identifier},
    },
    services::audit,
    utils::{hash::hash_password, jwt::CurrentUser},
};

/// Lists all users, newest first. Password hashes are never serialized.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, account, password_hash, role, status, real_name, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// Creates a user with an administrator-chosen id.
pub async fn create_user(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, account, password_hash, role, status, real_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.id)
    .bind(&payload.account)
    .bind(&hashed_password)
    .bind(payload.role)
    .bind(payload.status)
    .bind(&payload.name)
    .bind(chrono::Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "User id '{}' or account '{}' already exists",
                payload.id, payload.account
            ))
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })?;

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::CreateUser,
        &payload.id,
        &format!("account {} role {:?}", payload.account, payload.role),
    )
    .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "id": payload.id })),
    ))
}

/// Updates user information. The password is re-hashed when present.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if let Some(account) = &payload.account {
        validate_identifier(account).map_err(|_| {
            AppError::BadRequest("Account may only contain letters, digits, '_', '.', '-'".to_string())
        })?;
    }

    if payload.is_empty() {
        return Ok(Json(serde_json::json!({ "success": true })));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(account) = &payload.account {
        separated.push("account = ");
        separated.push_bind_unseparated(account.clone());
    }

    if let Some(role) = payload.role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    if let Some(name) = &payload.name {
        separated.push("real_name = ");
        separated.push_bind_unseparated(name.clone());
    }

    if let Some(password) = &payload.password {
        separated.push("password_hash = ");
        separated.push_bind_unseparated(hash_password(password)?);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id.clone());

    let mut tx = pool.begin().await?;

    let result = builder.build().execute(&mut *tx).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Account already exists".to_string())
        } else {
            tracing::error!("Failed to update user: {:?}", e);
            AppError::from(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let mut changed = Vec::new();
    if payload.account.is_some() {
        changed.push("account");
    }
    if payload.role.is_some() {
        changed.push("role");
    }
    if payload.status.is_some() {
        changed.push("status");
    }
    if payload.name.is_some() {
        changed.push("name");
    }
    if payload.password.is_some() {
        changed.push("password");
    }

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::UpdateUser,
        &id,
        &format!("changed: {}", changed.join(", ")),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Deactivates a user. Accounts are frozen rather than removed so their records
/// and audit trail stay intact. Prevents freezing oneself.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE users SET status = 'FROZEN' WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to freeze user: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::append(&mut tx, &admin.id, AuditAction::FreezeUser, &id, "account frozen").await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
