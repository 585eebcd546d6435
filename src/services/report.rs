// src/services/report.rs

use sqlx::SqlitePool;

use crate::{error::AppError, models::record::ExportRow, utils::csv};

pub const EXPORT_HEADERS: [&str; 6] = [
    "Student Name",
    "Student Account",
    "Exam Title",
    "Score",
    "Attempt",
    "Submitted At",
];

/// All records joined with student and exam, newest first.
pub async fn fetch_export_rows(pool: &SqlitePool) -> Result<Vec<ExportRow>, AppError> {
    let rows = sqlx::query_as::<_, ExportRow>(
        r#"
        SELECT
            u.real_name AS student_name,
            u.account AS student_account,
            e.title AS exam_title,
            r.score,
            r.attempt_number,
            r.submitted_at
        FROM records r
        JOIN users u ON r.student_id = u.id
        JOIN exams e ON r.exam_id = e.id
        ORDER BY r.submitted_at DESC, r.rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Renders export rows as CSV. `None` when there is nothing to export.
pub fn render_records_csv(rows: &[ExportRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let lines = rows.iter().map(|row| {
        vec![
            row.student_name.clone(),
            row.student_account.clone(),
            row.exam_title.clone(),
            row.score.to_string(),
            row.attempt_number.to_string(),
            row.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    });

    Some(csv::render(&EXPORT_HEADERS, lines))
}
