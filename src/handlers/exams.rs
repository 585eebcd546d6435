// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        audit_log::AuditAction,
        exam::{
            CreateExamRequest, Exam, ExamRow, UpdateExamRequest, max_score, validate_questions,
        },
    },
    services::audit,
    utils::{html::clean_html, jwt::CurrentUser},
};

fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Lists exams with their answer keys. Admin only.
pub async fn list_exams(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ExamRow>(
        r#"
        SELECT id, title, description, questions, related_course_ids, created_by, created_at
        FROM exams
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::from(e)
    })?;

    let exams = rows
        .into_iter()
        .map(Exam::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(exams))
}

/// Creates an exam; the authenticated admin is recorded as its creator.
pub async fn create_exam(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = Uuid::new_v4().to_string();
    let questions_json = to_json_text(&payload.questions)?;
    let related_json = to_json_text(&payload.related_course_ids)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO exams
            (id, title, description, questions, related_course_ids, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&payload.title)
    .bind(clean_html(&payload.description))
    .bind(&questions_json)
    .bind(&related_json)
    .bind(&admin.id)
    .bind(chrono::Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::from(e)
    })?;

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::CreateExam,
        &id,
        &format!(
            "{} ({} questions, {} points)",
            payload.title,
            payload.questions.len(),
            max_score(&payload.questions)
        ),
    )
    .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "id": id })),
    ))
}

/// Updates an exam by ID. Existing records keep the score they were given.
pub async fn update_exam(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if let Some(questions) = &payload.questions {
        validate_questions(questions).map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    if payload.is_empty() {
        return Ok(Json(serde_json::json!({ "success": true })));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = &payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.clone());
    }

    if let Some(description) = &payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(description));
    }

    if let Some(questions) = &payload.questions {
        separated.push("questions = ");
        separated.push_bind_unseparated(to_json_text(questions)?);
    }

    if let Some(related) = &payload.related_course_ids {
        separated.push("related_course_ids = ");
        separated.push_bind_unseparated(to_json_text(related)?);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id.clone());

    let mut tx = pool.begin().await?;

    let result = builder.build().execute(&mut *tx).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    audit::append(&mut tx, &admin.id, AuditAction::UpdateExam, &id, "exam updated").await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Deletes an exam together with its still-pending assignments.
/// Exams with submitted records are part of the audit trail and cannot be deleted.
pub async fn delete_exam(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let record_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE exam_id = ?")
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

    if record_count > 0 {
        return Err(AppError::Conflict(format!(
            "Exam has {} submitted record(s) and cannot be deleted",
            record_count
        )));
    }

    let removed = sqlx::query("DELETE FROM assignments WHERE exam_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let result = sqlx::query("DELETE FROM exams WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::DeleteExam,
        &id,
        &format!("exam deleted with {} pending assignment(s)", removed),
    )
    .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
