// src/handlers/student.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assignment::{PendingExam, PendingExamRow, StudentExamParams},
        record::{HistoryEntry, SubmitExamRequest},
    },
    services::submission,
    utils::jwt::CurrentUser,
};

/// Lists the caller's PENDING assignments with answer-free questions.
///
/// The student is always the authenticated caller; a `userId` query parameter is
/// accepted for compatibility but must name the caller.
pub async fn list_my_exams(
    State(pool): State<SqlitePool>,
    student: CurrentUser,
    Query(params): Query<StudentExamParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(user_id) = params.user_id.as_deref() {
        if user_id != student.id {
            return Err(AppError::Forbidden(
                "Cannot list exams of another user".to_string(),
            ));
        }
    }

    let rows = sqlx::query_as::<_, PendingExamRow>(
        r#"
        SELECT
            a.id AS assignment_id, e.id AS exam_id, e.title, e.description,
            e.questions, e.related_course_ids, a.status, a.assigned_at
        FROM assignments a
        JOIN exams e ON a.exam_id = e.id
        WHERE a.student_id = ? AND a.status = 'PENDING'
        ORDER BY a.assigned_at DESC
        "#,
    )
    .bind(&student.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch student exams: {:?}", e);
        AppError::from(e)
    })?;

    // A corrupt exam hides only itself, not the student's other assignments.
    let exams: Vec<PendingExam> = rows
        .into_iter()
        .filter_map(|row| {
            let assignment_id = row.assignment_id.clone();
            PendingExam::try_from(row)
                .inspect_err(|e| {
                    tracing::error!(%assignment_id, error = ?e, "skipping unreadable pending exam");
                })
                .ok()
        })
        .collect();

    Ok(Json(exams))
}

/// Submits answers for one of the caller's pending assignments.
///
/// * The student is taken from the token, never from the body.
/// * The score is computed here from the stored answer key.
/// * Record, assignment completion and audit entry commit together.
pub async fn submit_exam(
    State(pool): State<SqlitePool>,
    student: CurrentUser,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let response =
        submission::submit(&pool, &student.id, req.assignment_id.trim(), &req.answers).await?;

    Ok(Json(response))
}

/// The caller's own submission history, newest first.
pub async fn list_my_records(
    State(pool): State<SqlitePool>,
    student: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let history = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT
            r.id AS record_id, r.exam_id, e.title AS exam_title,
            r.score, r.attempt_number, r.submitted_at
        FROM records r
        JOIN exams e ON r.exam_id = e.id
        WHERE r.student_id = ?
        ORDER BY r.submitted_at DESC, r.rowid DESC
        "#,
    )
    .bind(&student.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(history))
}
