// src/services/grader.rs

//! Server-side scoring against the answer key stored with the exam.

use std::collections::HashMap;

use crate::{error::AppError, models::exam::Question};

/// Outcome of grading one answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub score: i64,
    pub max_score: i64,
    pub correct_count: usize,
}

/// Parses the stored question set of `exam_id`.
///
/// A set that does not parse, or parses to nothing, can never be graded and is
/// reported as a data-integrity fault.
pub fn parse_question_set(exam_id: &str, raw: &str) -> Result<Vec<Question>, AppError> {
    let questions: Vec<Question> = serde_json::from_str(raw).map_err(|e| {
        AppError::DataIntegrity(format!("exam {} has an unparsable question set: {}", exam_id, e))
    })?;

    if questions.is_empty() {
        return Err(AppError::DataIntegrity(format!(
            "exam {} has an empty question set",
            exam_id
        )));
    }
    Ok(questions)
}

/// Scores `answers` (question id -> submitted answer) against `questions`.
///
/// Only exact matches earn points. Unanswered questions and answers to unknown
/// question ids earn nothing; neither is an error.
pub fn grade(questions: &[Question], answers: &HashMap<String, String>) -> Grade {
    let mut score = 0;
    let mut max_score = 0;
    let mut correct_count = 0;

    for question in questions {
        let points = i64::from(question.points);
        max_score += points;

        let is_correct = answers
            .get(&question.id)
            .is_some_and(|submitted| submitted == question.correct_answer());

        if is_correct {
            score += points;
            correct_count += 1;
        }
    }

    Grade {
        score,
        max_score,
        correct_count,
    }
}
