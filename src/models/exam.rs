// src/models/exam.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::{error::AppError, services::grader};

/// Options shown for every true/false question.
pub const JUDGE_OPTIONS: [&str; 2] = ["True", "False"];

/// One question of an exam, including its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// Prompt text.
    pub content: String,

    /// Points awarded for a correct answer.
    pub points: u32,

    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Question shape plus its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum QuestionKind {
    /// Single choice; `answer` is one of `options`.
    Single { options: Vec<String>, answer: String },
    /// True/false.
    Judge { answer: bool },
}

impl Question {
    /// The exact string a submitted answer must equal to earn the points.
    pub fn correct_answer(&self) -> &str {
        match &self.kind {
            QuestionKind::Single { answer, .. } => answer,
            QuestionKind::Judge { answer: true } => JUDGE_OPTIONS[0],
            QuestionKind::Judge { answer: false } => JUDGE_OPTIONS[1],
        }
    }

    pub fn options(&self) -> Vec<String> {
        match &self.kind {
            QuestionKind::Single { options, .. } => options.clone(),
            QuestionKind::Judge { .. } => JUDGE_OPTIONS.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Single { .. } => "SINGLE",
            QuestionKind::Judge { .. } => "JUDGE",
        }
    }

    /// Student-facing view without the answer key.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            question_type: self.type_name(),
            content: self.content.clone(),
            options: self.options(),
            points: self.points,
        }
    }
}

/// DTO for sending a question to a student (excludes answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub content: String,
    pub options: Vec<String>,
    pub points: u32,
}

/// Sum of all point values of a question set.
pub fn max_score(questions: &[Question]) -> i64 {
    questions.iter().map(|q| i64::from(q.points)).sum()
}

/// Raw 'exams' row. `questions` and `related_course_ids` are JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct ExamRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: String,
    pub related_course_ids: String,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Admin view of an exam, answer keys included.
#[derive(Debug, Serialize)]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub related_course_ids: Vec<String>,
    pub total_points: i64,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ExamRow> for Exam {
    type Error = AppError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let questions = grader::parse_question_set(&row.id, &row.questions)?;
        let related_course_ids: Vec<String> = serde_json::from_str(&row.related_course_ids)
            .map_err(|e| {
                AppError::DataIntegrity(format!("exam {} has bad related_course_ids: {}", row.id, e))
            })?;

        Ok(Exam {
            total_points: max_score(&questions),
            id: row.id,
            title: row.title,
            description: row.description,
            questions,
            related_course_ids,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// DTO for creating an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub related_course_ids: Vec<String>,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    #[validate(length(max = 100))]
    pub related_course_ids: Option<Vec<String>>,
}

impl UpdateExamRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.questions.is_none()
            && self.related_course_ids.is_none()
    }
}

/// Structural checks for a question set before it is stored.
pub fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    if questions.len() > 500 {
        return Err(validator::ValidationError::new("too_many_questions"));
    }

    let mut seen = HashSet::new();
    for q in questions {
        if q.id.trim().is_empty() || q.id.len() > 64 {
            return Err(validator::ValidationError::new("invalid_question_id"));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(validator::ValidationError::new("duplicate_question_id"));
        }
        if q.content.trim().is_empty() || q.content.len() > 2000 {
            return Err(validator::ValidationError::new("invalid_question_content"));
        }
        if q.points > 1000 {
            return Err(validator::ValidationError::new("points_too_large"));
        }
        if let QuestionKind::Single { options, answer } = &q.kind {
            if options.len() < 2 {
                return Err(validator::ValidationError::new("too_few_options"));
            }
            if options.iter().any(|o| o.is_empty() || o.len() > 500) {
                return Err(validator::ValidationError::new("invalid_option"));
            }
            if !options.contains(answer) {
                return Err(validator::ValidationError::new("answer_not_in_options"));
            }
        }
    }
    Ok(())
}
