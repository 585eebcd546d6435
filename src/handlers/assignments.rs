// src/handlers/assignments.rs

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assignment::{AssignmentListParams, AssignmentSummary, CreateAssignmentsRequest},
        audit_log::AuditAction,
        user::Role,
    },
    services::audit,
    utils::jwt::CurrentUser,
};

/// Assigns one exam to many students at once.
///
/// All rows are inserted in a single transaction: either every student gets a
/// PENDING assignment or none does.
pub async fn create_assignments(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Json(payload): Json<CreateAssignmentsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Duplicates in one request collapse to one assignment per student.
    let student_ids: BTreeSet<&str> = payload
        .student_ids
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if student_ids.is_empty() {
        return Err(AppError::BadRequest("student_ids must not be empty".to_string()));
    }

    let exam_exists: Option<String> = sqlx::query_scalar("SELECT id FROM exams WHERE id = ?")
        .bind(&payload.exam_id)
        .fetch_optional(&pool)
        .await?;

    if exam_exists.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let mut lookup: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id FROM users WHERE role = ");
    lookup.push_bind(Role::Student);
    lookup.push(" AND id IN (");
    let mut separated = lookup.separated(",");
    for id in &student_ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");

    let known: BTreeSet<String> = lookup
        .build_query_scalar::<String>()
        .fetch_all(&pool)
        .await?
        .into_iter()
        .collect();

    let unknown: Vec<&str> = student_ids
        .iter()
        .copied()
        .filter(|id| !known.contains(*id))
        .collect();

    if !unknown.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Unknown or non-student ids: {}",
            unknown.join(", ")
        )));
    }

    let now = chrono::Utc::now();
    let mut created = Vec::with_capacity(student_ids.len());
    let mut tx = pool.begin().await?;

    for student_id in &student_ids {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO assignments (id, exam_id, student_id, assigned_by, assigned_at, status)
            VALUES (?, ?, ?, ?, ?, 'PENDING')
            "#,
        )
        .bind(&id)
        .bind(&payload.exam_id)
        .bind(*student_id)
        .bind(&admin.id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create assignment: {:?}", e);
            AppError::from(e)
        })?;
        created.push(id);
    }

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::AssignExam,
        &payload.exam_id,
        &format!("assigned to {} student(s)", created.len()),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(exam_id = %payload.exam_id, count = created.len(), "exam assigned");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "created": created.len(),
            "assignment_ids": created,
        })),
    ))
}

/// Lists assignments, optionally filtered by exam and status.
pub async fn list_assignments(
    State(pool): State<SqlitePool>,
    Query(params): Query<AssignmentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            a.id, a.exam_id, e.title AS exam_title,
            a.student_id, u.real_name AS student_name,
            a.status, a.assigned_at, a.completed_at
        FROM assignments a
        JOIN exams e ON a.exam_id = e.id
        JOIN users u ON a.student_id = u.id
        WHERE 1 = 1
        "#,
    );

    if let Some(exam_id) = params.exam_id {
        builder.push(" AND a.exam_id = ");
        builder.push_bind(exam_id);
    }

    if let Some(status) = params.status {
        builder.push(" AND a.status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY a.assigned_at DESC");

    let rows = builder
        .build_query_as::<AssignmentSummary>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list assignments: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(rows))
}
