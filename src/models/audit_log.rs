// src/models/audit_log.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    SubmitExam,
    CreateUser,
    UpdateUser,
    FreezeUser,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    CreateExam,
    UpdateExam,
    DeleteExam,
    AssignExam,
}

/// Append-only 'audit_logs' row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_id: String,
    pub action: AuditAction,
    pub target_id: String,
    pub detail: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<i64>,
}
