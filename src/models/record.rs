// src/models/record.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Represents the 'records' table.
/// Written once per successful submission and never changed afterwards.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Record {
    pub id: String,
    pub assignment_id: String,
    pub exam_id: String,
    pub student_id: String,
    pub score: i64,
    pub answers: Json<HashMap<String, String>>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub attempt_number: i64,
}

/// Records list row, joined with exam title and student identity.
#[derive(Debug, Serialize, FromRow)]
pub struct RecordSummary {
    pub id: String,
    pub exam_id: String,
    pub exam_title: String,
    pub student_id: String,
    pub student_name: String,
    pub student_account: String,
    pub score: i64,
    pub attempt_number: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// A student's own history entry.
#[derive(Debug, Serialize, FromRow)]
pub struct HistoryEntry {
    pub record_id: String,
    pub exam_id: String,
    pub exam_title: String,
    pub score: i64,
    pub attempt_number: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Row fed into the CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct ExportRow {
    pub student_name: String,
    pub student_account: String,
    pub exam_title: String,
    pub score: i64,
    pub attempt_number: i64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Query filters for the admin records list.
#[derive(Debug, Deserialize)]
pub struct RecordListParams {
    pub exam_id: Option<String>,
    pub student_id: Option<String>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[validate(length(min = 1, max = 64))]
    pub assignment_id: String,

    /// User's answers map.
    /// Key: question id
    /// Value: selected option, "True"/"False" for judge questions
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub success: bool,
    pub score: i64,
    pub max_score: i64,
    pub attempt_number: i64,
    pub record_id: String,
}
