// src/handlers/courses.rs

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
        course::{Course, CourseRow, CreateCourseRequest, UpdateCourseRequest},
    },
    services::audit,
    utils::jwt::CurrentUser,
};

async fn fetch_courses(pool: &SqlitePool, published_only: bool) -> Result<Vec<Course>, AppError> {
    let sql = if published_only {
        r#"
        SELECT id, title, content_type, content_body, status, created_at
        FROM courses
        WHERE status = 'PUBLISHED'
        ORDER BY created_at DESC
        "#
    } else {
        r#"
        SELECT id, title, content_type, content_body, status, created_at
        FROM courses
        ORDER BY created_at DESC
        "#
    };

    let rows = sqlx::query_as::<_, CourseRow>(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list courses: {:?}", e);
            AppError::from(e)
        })?;

    rows.into_iter().map(Course::try_from).collect()
}

/// Lists every course. Admin only.
pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_courses(&pool, false).await?))
}

/// Lists published courses for students.
pub async fn list_published_courses(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_courses(&pool, true).await?))
}

pub async fn create_course(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let content = payload.content.normalized()?;
    let id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO courses (id, title, content_type, content_body, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&payload.title)
    .bind(content.type_name())
    .bind(content.body())
    .bind(payload.status)
    .bind(chrono::Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    audit::append(
        &mut tx,
        &admin.id,
        AuditAction::CreateCourse,
        &id,
        &format!("{} ({})", payload.title, content.type_name()),
    )
    .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "id": id })),
    ))
}

/// Updates a course by ID. Fields are optional.
pub async fn update_course(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let content = payload.content()?.map(|c| c.normalized()).transpose()?;

    if payload.is_empty() {
        return Ok(Json(serde_json::json!({ "success": true })));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE courses SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = &payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.clone());
    }

    if let Some(content) = &content {
        separated.push("content_type = ");
        separated.push_bind_unseparated(content.type_name());
        separated.push("content_body = ");
        separated.push_bind_unseparated(content.body().to_string());
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id.clone());

    let mut tx = pool.begin().await?;

    let result = builder.build().execute(&mut *tx).await.map_err(|e| {
        tracing::error!("Failed to update course: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    audit::append(&mut tx, &admin.id, AuditAction::UpdateCourse, &id, "course updated").await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Deletes a course by ID. Exams referencing it keep the dangling id.
pub async fn delete_course(
    State(pool): State<SqlitePool>,
    admin: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete course: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    audit::append(&mut tx, &admin.id, AuditAction::DeleteCourse, &id, "course deleted").await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
