// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::exam::{PublicQuestion, max_score};
use crate::{error::AppError, services::grader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentStatus {
    Pending,
    Completed,
}

/// Represents the 'assignments' table: one exam bound to one student.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: String,
    pub exam_id: String,
    pub student_id: String,
    pub assigned_by: String,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
    pub status: AssignmentStatus,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for bulk assignment of one exam to many students.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentsRequest {
    #[validate(length(min = 1, max = 64))]
    pub exam_id: String,
    #[validate(length(min = 1, max = 1000, message = "student_ids must contain 1-1000 ids"))]
    pub student_ids: Vec<String>,
}

/// Query filters for the admin assignment list.
#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    pub exam_id: Option<String>,
    pub status: Option<AssignmentStatus>,
}

/// Admin list row, joined with exam title and student name.
#[derive(Debug, Serialize, FromRow)]
pub struct AssignmentSummary {
    pub id: String,
    pub exam_id: String,
    pub exam_title: String,
    pub student_id: String,
    pub student_name: String,
    pub status: AssignmentStatus,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Pending assignment joined with its exam, as read from the database.
#[derive(Debug, FromRow)]
pub struct PendingExamRow {
    pub assignment_id: String,
    pub exam_id: String,
    pub title: String,
    pub description: String,
    pub questions: String,
    pub related_course_ids: String,
    pub status: AssignmentStatus,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

/// Student-facing pending exam. Carries no answer keys.
#[derive(Debug, Serialize)]
pub struct PendingExam {
    pub assignment_id: String,
    pub exam_id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
    pub total_points: i64,
    pub related_course_ids: Vec<String>,
    pub status: AssignmentStatus,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PendingExamRow> for PendingExam {
    type Error = AppError;

    fn try_from(row: PendingExamRow) -> Result<Self, Self::Error> {
        let questions = grader::parse_question_set(&row.exam_id, &row.questions)?;
        let related_course_ids: Vec<String> = serde_json::from_str(&row.related_course_ids)
            .map_err(|e| {
                AppError::DataIntegrity(format!(
                    "exam {} has bad related_course_ids: {}",
                    row.exam_id, e
                ))
            })?;

        Ok(PendingExam {
            assignment_id: row.assignment_id,
            exam_id: row.exam_id,
            title: row.title,
            description: row.description,
            total_points: max_score(&questions),
            questions: questions.iter().map(|q| q.to_public()).collect(),
            related_course_ids,
            status: row.status,
            assigned_at: row.assigned_at,
        })
    }
}

/// Query string accepted by the student exam list.
#[derive(Debug, Deserialize)]
pub struct StudentExamParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(questions: &str, related_course_ids: &str) -> PendingExamRow {
        PendingExamRow {
            assignment_id: "a1".to_string(),
            exam_id: "e1".to_string(),
            title: "Safety 2026".to_string(),
            description: String::new(),
            questions: questions.to_string(),
            related_course_ids: related_course_ids.to_string(),
            status: AssignmentStatus::Pending,
            assigned_at: chrono::Utc::now(),
        }
    }

    const QUESTIONS: &str =
        r#"[{"id":"q1","type":"JUDGE","content":"Fire exits stay clear.","answer":true,"points":5}]"#;

    #[test]
    fn pending_exam_hides_answers() {
        let exam = PendingExam::try_from(row(QUESTIONS, r#"["c1"]"#)).unwrap();
        assert_eq!(exam.total_points, 5);
        assert_eq!(exam.related_course_ids, vec!["c1"]);

        let json = serde_json::to_value(&exam).unwrap();
        assert!(json["questions"][0].get("answer").is_none());
    }

    #[test]
    fn corrupt_related_courses_is_a_data_integrity_error() {
        let res = PendingExam::try_from(row(QUESTIONS, "not json"));
        assert!(matches!(res, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn corrupt_questions_is_a_data_integrity_error() {
        let res = PendingExam::try_from(row("{broken", "[]"));
        assert!(matches!(res, Err(AppError::DataIntegrity(_))));
    }
}
