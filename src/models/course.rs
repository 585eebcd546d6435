// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::{error::AppError, utils::html::clean_html};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CourseStatus {
    #[default]
    Published,
    Unpublished,
}

/// What a course points at.
///
/// Serialized as `{"content_type": "LINK", "content_body": "https://..."}` so the
/// wire shape matches the two storage columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_type", content = "content_body", rename_all = "UPPERCASE")]
pub enum CourseContent {
    /// Reference to an uploaded file (storage itself is out of scope).
    File(String),
    Link(String),
    /// Inline rich text, stored sanitised.
    Text(String),
}

impl CourseContent {
    pub fn type_name(&self) -> &'static str {
        match self {
            CourseContent::File(_) => "FILE",
            CourseContent::Link(_) => "LINK",
            CourseContent::Text(_) => "TEXT",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            CourseContent::File(body) | CourseContent::Link(body) | CourseContent::Text(body) => {
                body
            }
        }
    }

    /// Rebuilds the variant from the two storage columns.
    pub fn from_columns(content_type: &str, body: String) -> Option<Self> {
        match content_type {
            "FILE" => Some(CourseContent::File(body)),
            "LINK" => Some(CourseContent::Link(body)),
            "TEXT" => Some(CourseContent::Text(body)),
            _ => None,
        }
    }

    /// Checks the body against its variant and returns the form that gets stored.
    pub fn normalized(self) -> Result<Self, AppError> {
        match self {
            CourseContent::File(path) => {
                let path = path.trim().to_string();
                if path.is_empty() || path.len() > 500 {
                    return Err(AppError::BadRequest(
                        "File reference must be 1-500 characters".to_string(),
                    ));
                }
                Ok(CourseContent::File(path))
            }
            CourseContent::Link(link) => {
                let link = link.trim().to_string();
                if link.len() > 2000 || Url::parse(&link).is_err() {
                    return Err(AppError::BadRequest("Invalid course link".to_string()));
                }
                Ok(CourseContent::Link(link))
            }
            CourseContent::Text(text) => {
                if text.len() > 100_000 {
                    return Err(AppError::BadRequest("Course text is too long".to_string()));
                }
                Ok(CourseContent::Text(clean_html(&text)))
            }
        }
    }
}

/// Raw 'courses' row.
#[derive(Debug, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub content_type: String,
    pub content_body: String,
    pub status: CourseStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub content: CourseContent,
    pub status: CourseStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = AppError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let content = CourseContent::from_columns(&row.content_type, row.content_body)
            .ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "course {} has unknown content type {}",
                    row.id, row.content_type
                ))
            })?;

        Ok(Course {
            id: row.id,
            title: row.title,
            content,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(flatten)]
    pub content: CourseContent,
    #[serde(default)]
    pub status: CourseStatus,
}

/// DTO for updating a course. Content type and body travel together.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub content_body: Option<String>,
    pub status: Option<CourseStatus>,
}

impl UpdateCourseRequest {
    pub fn content(&self) -> Result<Option<CourseContent>, AppError> {
        match (&self.content_type, &self.content_body) {
            (None, None) => Ok(None),
            (Some(content_type), Some(body)) => CourseContent::from_columns(content_type, body.clone())
                .map(Some)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown content type {}", content_type))),
            _ => Err(AppError::BadRequest(
                "content_type and content_body must be provided together".to_string(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content_type.is_none()
            && self.content_body.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_deserializes_from_flat_columns() {
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Fire safety",
            "content_type": "LINK",
            "content_body": "https://example.com/fire"
        }))
        .unwrap();

        assert_eq!(
            req.content,
            CourseContent::Link("https://example.com/fire".to_string())
        );
        assert_eq!(req.status, CourseStatus::Published);
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let res: Result<CreateCourseRequest, _> = serde_json::from_value(serde_json::json!({
            "title": "Handbook",
            "content_type": "VIDEO",
            "content_body": "x"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn update_requires_type_and_body_together() {
        let req: UpdateCourseRequest = serde_json::from_value(serde_json::json!({
            "content_type": "TEXT"
        }))
        .unwrap();
        assert!(req.content().is_err());

        let req: UpdateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Renamed"
        }))
        .unwrap();
        assert!(req.content().unwrap().is_none());
        assert!(!req.is_empty());
    }

    #[test]
    fn link_must_be_a_url() {
        let err = CourseContent::Link("not a url".into()).normalized();
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn text_is_sanitised() {
        let content = CourseContent::Text("<p>Rules</p><script>alert(1)</script>".into())
            .normalized()
            .unwrap();
        assert_eq!(content.body(), "<p>Rules</p>");
        assert_eq!(content.type_name(), "TEXT");
    }
}
