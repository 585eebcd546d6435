// src/handlers/dashboard.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::AppError,
    models::audit_log::{AuditLogEntry, AuditLogParams},
};

const DEFAULT_AUDIT_LIMIT: i64 = 100;
const MAX_AUDIT_LIMIT: i64 = 500;

#[derive(Debug, Serialize, FromRow)]
pub struct DashboardStats {
    pub pending_assignments: i64,
    pub completed_assignments: i64,
    pub students: i64,
    pub exams: i64,
    pub records: i64,
}

/// Headline counters for the admin dashboard.
pub async fn get_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM assignments WHERE status = 'PENDING') AS pending_assignments,
            (SELECT COUNT(*) FROM assignments WHERE status = 'COMPLETED') AS completed_assignments,
            (SELECT COUNT(*) FROM users WHERE role = 'STUDENT') AS students,
            (SELECT COUNT(*) FROM exams) AS exams,
            (SELECT COUNT(*) FROM records) AS records
        "#,
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(stats))
}

/// Newest audit entries first.
pub async fn list_audit_logs(
    State(pool): State<SqlitePool>,
    Query(params): Query<AuditLogParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    let entries = sqlx::query_as::<_, AuditLogEntry>(
        r#"
        SELECT id, actor_id, action, target_id, detail, created_at
        FROM audit_logs
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(entries))
}
