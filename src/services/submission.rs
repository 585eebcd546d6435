// src/services/submission.rs

//! Exam submission: resolve the assignment, grade server-side, commit atomically.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqlitePool, types::Json};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        assignment::Assignment,
        audit_log::AuditAction,
        exam::Question,
        record::{Record, SubmitExamResponse},
    },
    services::{
        audit,
        grader::{self, Grade},
    },
};

/// Fetches the assignment only if it belongs to `student_id` and is still PENDING.
///
/// Every miss (unknown id, someone else's assignment, already completed) yields the
/// same `NotEligible` error.
pub async fn resolve_assignment(
    pool: &SqlitePool,
    assignment_id: &str,
    student_id: &str,
) -> Result<Assignment, AppError> {
    if assignment_id.is_empty() || student_id.is_empty() {
        return Err(AppError::NotEligible);
    }

    sqlx::query_as::<_, Assignment>(
        r#"
        SELECT id, exam_id, student_id, assigned_by, assigned_at, status, completed_at
        FROM assignments
        WHERE id = ? AND student_id = ? AND status = 'PENDING'
        "#,
    )
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotEligible)
}

/// Loads and parses the question set of an exam.
pub async fn load_questions(pool: &SqlitePool, exam_id: &str) -> Result<Vec<Question>, AppError> {
    let raw: Option<String> = sqlx::query_scalar("SELECT questions FROM exams WHERE id = ?")
        .bind(exam_id)
        .fetch_optional(pool)
        .await?;

    let raw = raw.ok_or_else(|| {
        AppError::DataIntegrity(format!("assignment references missing exam {}", exam_id))
    })?;

    grader::parse_question_set(exam_id, &raw)
}

/// Writes the record, completes the assignment and appends the audit entry as one
/// transaction.
///
/// The PENDING -> COMPLETED flip is a conditional update and runs first, so of two
/// concurrent submissions for the same assignment only one gets past it; the loser
/// rolls back with `NotEligible`. The attempt number is counted inside the same
/// transaction, after the write lock is held. Any storage failure rolls everything
/// back and surfaces as `CommitFailed`.
pub async fn commit(
    pool: &SqlitePool,
    assignment: &Assignment,
    grade: &Grade,
    answers: &HashMap<String, String>,
) -> Result<Record, AppError> {
    let commit_failed = |e: sqlx::Error| AppError::CommitFailed(e.to_string());
    let now = Utc::now();

    let mut tx = pool.begin().await.map_err(commit_failed)?;

    let flipped = sqlx::query(
        r#"
        UPDATE assignments
        SET status = 'COMPLETED', completed_at = ?
        WHERE id = ? AND student_id = ? AND status = 'PENDING'
        "#,
    )
    .bind(now)
    .bind(&assignment.id)
    .bind(&assignment.student_id)
    .execute(&mut *tx)
    .await
    .map_err(commit_failed)?;

    if flipped.rows_affected() == 0 {
        // Someone else completed it between resolve and commit.
        return Err(AppError::NotEligible);
    }

    let prior_attempts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE student_id = ? AND exam_id = ?")
            .bind(&assignment.student_id)
            .bind(&assignment.exam_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(commit_failed)?;

    let record = Record {
        id: Uuid::new_v4().to_string(),
        assignment_id: assignment.id.clone(),
        exam_id: assignment.exam_id.clone(),
        student_id: assignment.student_id.clone(),
        score: grade.score,
        answers: Json(answers.clone()),
        submitted_at: now,
        attempt_number: prior_attempts + 1,
    };

    sqlx::query(
        r#"
        INSERT INTO records
            (id, assignment_id, exam_id, student_id, score, answers, submitted_at, attempt_number)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.assignment_id)
    .bind(&record.exam_id)
    .bind(&record.student_id)
    .bind(record.score)
    .bind(&record.answers)
    .bind(record.submitted_at)
    .bind(record.attempt_number)
    .execute(&mut *tx)
    .await
    .map_err(commit_failed)?;

    let detail = format!(
        "score {}/{} attempt {} assignment {}",
        grade.score, grade.max_score, record.attempt_number, assignment.id
    );
    audit::append(
        &mut tx,
        &assignment.student_id,
        AuditAction::SubmitExam,
        &assignment.exam_id,
        &detail,
    )
    .await
    .map_err(commit_failed)?;

    tx.commit().await.map_err(commit_failed)?;

    Ok(record)
}

/// Full submission flow for an authenticated student.
pub async fn submit(
    pool: &SqlitePool,
    student_id: &str,
    assignment_id: &str,
    answers: &HashMap<String, String>,
) -> Result<SubmitExamResponse, AppError> {
    let assignment = match resolve_assignment(pool, assignment_id, student_id).await {
        Ok(assignment) => assignment,
        Err(e) => {
            if matches!(e, AppError::NotEligible) {
                tracing::info!(assignment_id, student_id, "submission rejected: not eligible");
            }
            return Err(e);
        }
    };

    let questions = load_questions(pool, &assignment.exam_id).await?;
    let grade = grader::grade(&questions, answers);

    let record = commit(pool, &assignment, &grade, answers)
        .await
        .inspect_err(|e| {
            tracing::warn!(assignment_id, student_id, error = %e, "submission not committed");
        })?;

    tracing::info!(
        assignment_id,
        student_id,
        exam_id = %record.exam_id,
        score = record.score,
        attempt = record.attempt_number,
        "exam submitted"
    );

    Ok(SubmitExamResponse {
        success: true,
        score: grade.score,
        max_score: grade.max_score,
        attempt_number: record.attempt_number,
        record_id: record.id,
    })
}
