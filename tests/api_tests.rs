// tests/api_tests.rs

mod common;

use common::{ADMIN_ID, admin_token, seed_user, seed_user_with_password, spawn_app, token_for};
use compliance_portal::models::user::Role;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn login_returns_token_and_profile() {
    let app = spawn_app().await;
    seed_user_with_password(&app.pool, "stu_01", "zhangsan", "password123", Role::Student).await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "account": "zhangsan", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "stu_01");
    assert_eq!(body["role"], "STUDENT");
    assert_eq!(body["type"], "Bearer");
    assert!(body.get("password_hash").is_none());

    // The token works on a student route
    let token = body["token"].as_str().unwrap();
    let response = app
        .client
        .get(app.url("/api/student/exams"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn login_fails_uniformly() {
    let app = spawn_app().await;
    seed_user_with_password(&app.pool, "stu_01", "zhangsan", "password123", Role::Student).await;

    let wrong_password = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "account": "zhangsan", "password": "nope" }))
        .send()
        .await
        .unwrap();
    let unknown_account = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "account": "nobody", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_password.status().as_u16(), 401);
    assert_eq!(unknown_account.status().as_u16(), 401);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_account.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn frozen_user_cannot_log_in() {
    let app = spawn_app().await;
    seed_user_with_password(&app.pool, "stu_01", "zhangsan", "password123", Role::Student).await;

    let response = app
        .client
        .delete(app.url("/api/admin/users/stu_01"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "account": "zhangsan", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Frozen, not removed
    let status: String = sqlx::query_scalar("SELECT status FROM users WHERE id = 'stu_01'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "FROZEN");
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = spawn_app().await;

    let no_token = app
        .client
        .get(app.url("/api/admin/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(no_token.status().as_u16(), 401);

    let forged = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 401);
    let body: Value = forged.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn wrong_role_is_403() {
    let app = spawn_app().await;
    seed_user(&app.pool, "stu_01", Role::Student).await;

    let student_on_admin = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(token_for("stu_01", Role::Student))
        .send()
        .await
        .unwrap();
    assert_eq!(student_on_admin.status().as_u16(), 403);

    let admin_on_student = app
        .client
        .post(app.url("/api/student/submit"))
        .bearer_auth(admin_token())
        .json(&json!({ "assignment_id": "x", "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(admin_on_student.status().as_u16(), 403);
}

#[tokio::test]
async fn user_crud_flow() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/admin/users"))
        .bearer_auth(admin_token())
        .json(&json!({
            "id": "stu_09",
            "account": "wangwu",
            "password": "password123",
            "role": "STUDENT",
            "name": "Wang Wu"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Same account again
    let response = app
        .client
        .post(app.url("/api/admin/users"))
        .bearer_auth(admin_token())
        .json(&json!({
            "id": "stu_10",
            "account": "wangwu",
            "password": "password123",
            "role": "STUDENT",
            "name": "Someone Else"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .put(app.url("/api/admin/users/stu_09"))
        .bearer_auth(admin_token())
        .json(&json!({ "name": "Wang Wu (HR)" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let users: Vec<Value> = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let wangwu = users.iter().find(|u| u["id"] == "stu_09").unwrap();
    assert_eq!(wangwu["name"], "Wang Wu (HR)");
    assert!(wangwu.get("password_hash").is_none());

    let response = app
        .client
        .put(app.url("/api/admin/users/ghost"))
        .bearer_auth(admin_token())
        .json(&json!({ "name": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let app = spawn_app().await;

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/users/{}", ADMIN_ID)))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn course_flow_and_published_filter() {
    let app = spawn_app().await;
    seed_user(&app.pool, "stu_01", Role::Student).await;

    let response = app
        .client
        .post(app.url("/api/admin/courses"))
        .bearer_auth(admin_token())
        .json(&json!({
            "title": "Fire safety",
            "content_type": "TEXT",
            "content_body": "<p>Exits</p><script>alert(1)</script>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let course_id = body["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(app.url("/api/admin/courses"))
        .bearer_auth(admin_token())
        .json(&json!({
            "title": "Draft handbook",
            "content_type": "LINK",
            "content_body": "https://example.com/handbook",
            "status": "UNPUBLISHED"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .client
        .post(app.url("/api/admin/courses"))
        .bearer_auth(admin_token())
        .json(&json!({
            "title": "Broken link",
            "content_type": "LINK",
            "content_body": "not a url"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let visible: Vec<Value> = app
        .client
        .get(app.url("/api/student/courses"))
        .bearer_auth(token_for("stu_01", Role::Student))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"], course_id.as_str());
    assert_eq!(visible[0]["content_type"], "TEXT");
    assert!(!visible[0]["content_body"].as_str().unwrap().contains("<script>"));

    let all: Vec<Value> = app
        .client
        .get(app.url("/api/admin/courses"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/courses/{}", course_id)))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
}

#[tokio::test]
async fn exam_validation_rejects_bad_answer_key() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/admin/exams"))
        .bearer_auth(admin_token())
        .json(&json!({
            "title": "Broken",
            "questions": [{
                "id": "q1",
                "type": "SINGLE",
                "content": "Pick one",
                "options": ["A", "B"],
                "answer": "Z",
                "points": 10
            }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .post(app.url("/api/admin/exams"))
        .bearer_auth(admin_token())
        .json(&json!({ "title": "Empty", "questions": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_exam_list_includes_answer_key() {
    let app = spawn_app().await;
    app.create_exam(&common::sample_exam("Safety 2026")).await;

    let exams: Vec<Value> = app
        .client
        .get(app.url("/api/admin/exams"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0]["total_points"], 15);
    assert_eq!(exams[0]["questions"][0]["answer"], "B");
    assert_eq!(exams[0]["created_by"], ADMIN_ID);
}

#[tokio::test]
async fn audit_log_records_admin_actions() {
    let app = spawn_app().await;
    let exam_id = app.create_exam(&common::sample_exam("Safety 2026")).await;

    let entries: Vec<Value> = app
        .client
        .get(app.url("/api/admin/audit-logs?limit=10"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "CREATE_EXAM");
    assert_eq!(entries[0]["actor_id"], ADMIN_ID);
    assert_eq!(entries[0]["target_id"], exam_id.as_str());

    // Append-only at the storage level
    let res = sqlx::query("DELETE FROM audit_logs").execute(&app.pool).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn frozen_admin_loses_admin_rights() {
    let app = spawn_app().await;
    seed_user(&app.pool, "admin_02", Role::Admin).await;
    let token = token_for("admin_02", Role::Admin);

    let response = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .delete(app.url("/api/admin/users/admin_02"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn token_for_unknown_or_demoted_user_is_401() {
    let app = spawn_app().await;
    seed_user(&app.pool, "stu_01", Role::Student).await;

    let ghost = app
        .client
        .get(app.url("/api/student/exams"))
        .bearer_auth(token_for("ghost", Role::Student))
        .send()
        .await
        .unwrap();
    assert_eq!(ghost.status().as_u16(), 401);

    // A student holding a validly signed admin token is still refused
    let promoted = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(token_for("stu_01", Role::Admin))
        .send()
        .await
        .unwrap();
    assert_eq!(promoted.status().as_u16(), 401);
}
