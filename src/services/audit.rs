// src/services/audit.rs

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::audit_log::AuditAction;

/// Appends one audit entry on the given connection.
///
/// Callers pass their open transaction so the entry commits or rolls back together
/// with the change it describes.
pub async fn append(
    conn: &mut SqliteConnection,
    actor_id: &str,
    action: AuditAction,
    target_id: &str,
    detail: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, actor_id, action, target_id, detail, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(actor_id)
    .bind(action)
    .bind(target_id)
    .bind(detail)
    .bind(chrono::Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}
