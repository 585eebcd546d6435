// src/handlers/records.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::record::{Record, RecordListParams, RecordSummary},
    services::report,
};

/// Lists submitted records joined with student and exam, newest first.
pub async fn list_records(
    State(pool): State<SqlitePool>,
    Query(params): Query<RecordListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT
            r.id, r.exam_id, e.title AS exam_title,
            r.student_id, u.real_name AS student_name, u.account AS student_account,
            r.score, r.attempt_number, r.submitted_at
        FROM records r
        JOIN exams e ON r.exam_id = e.id
        JOIN users u ON r.student_id = u.id
        WHERE 1 = 1
        "#,
    );

    if let Some(exam_id) = params.exam_id {
        builder.push(" AND r.exam_id = ");
        builder.push_bind(exam_id);
    }

    if let Some(student_id) = params.student_id {
        builder.push(" AND r.student_id = ");
        builder.push_bind(student_id);
    }

    builder.push(" ORDER BY r.submitted_at DESC, r.rowid DESC");

    let records = builder
        .build_query_as::<RecordSummary>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list records: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(records))
}

/// Returns one record including the answers exactly as submitted.
pub async fn get_record(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = sqlx::query_as::<_, Record>(
        r#"
        SELECT id, assignment_id, exam_id, student_id, score, answers, submitted_at, attempt_number
        FROM records
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;

    Ok(Json(record))
}

/// Downloads all records as a spreadsheet-friendly CSV file.
pub async fn export_records(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let rows = report::fetch_export_rows(&pool).await?;

    let body = report::render_records_csv(&rows)
        .ok_or_else(|| AppError::NotFound("No records found".to_string()))?;

    let filename = format!(
        "exam_records_{}.csv",
        chrono::Utc::now().timestamp_millis()
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    tracing::info!(rows = rows.len(), "records exported");

    Ok((headers, body))
}
