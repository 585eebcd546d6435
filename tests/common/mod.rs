// tests/common/mod.rs

#![allow(dead_code)]

use std::str::FromStr;

use compliance_portal::{
    config::Config,
    db,
    models::user::Role,
    routes,
    state::AppState,
    utils::{hash::hash_password, jwt::sign_jwt},
};
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";
pub const ADMIN_ID: &str = "admin_01";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port backed by a fresh in-memory database.
/// An administrator with id `ADMIN_ID` is always present.
pub async fn spawn_app() -> TestApp {
    // 1. One connection that never expires, so the in-memory database lives as long as the pool
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory sqlite");

    // 2. Run migrations
    db::migrate(&pool).await.expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        admin_id: ADMIN_ID.to_string(),
        admin_account: None,
        admin_password: None,
        admin_name: "Administrator".to_string(),
    };

    seed_user(&pool, ADMIN_ID, Role::Admin).await;

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

/// Inserts a user that is only ever used through minted tokens (no usable password).
pub async fn seed_user(pool: &SqlitePool, id: &str, role: Role) {
    insert_user(pool, id, id, "not-a-phc-hash", role).await;
}

/// Inserts a user that can log in with `password`.
pub async fn seed_user_with_password(
    pool: &SqlitePool,
    id: &str,
    account: &str,
    password: &str,
    role: Role,
) {
    let hash = hash_password(password).unwrap();
    insert_user(pool, id, account, &hash, role).await;
}

async fn insert_user(pool: &SqlitePool, id: &str, account: &str, password_hash: &str, role: Role) {
    sqlx::query(
        r#"
        INSERT INTO users (id, account, password_hash, role, status, real_name, created_at)
        VALUES (?, ?, ?, ?, 'ACTIVE', ?, ?)
        "#,
    )
    .bind(id)
    .bind(account)
    .bind(password_hash)
    .bind(role)
    .bind(format!("Name of {}", id))
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .expect("Failed to seed user");
}

pub fn token_for(id: &str, role: Role) -> String {
    sign_jwt(id, role, TEST_SECRET, 600).unwrap()
}

pub fn admin_token() -> String {
    token_for(ADMIN_ID, Role::Admin)
}

/// Two questions worth 10 + 5 points; correct answers are "B" and "True".
pub fn sample_exam(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Annual compliance check",
        "questions": [
            {
                "id": "q1",
                "type": "SINGLE",
                "content": "Which form must be filed?",
                "options": ["A", "B", "C"],
                "answer": "B",
                "points": 10
            },
            {
                "id": "q2",
                "type": "JUDGE",
                "content": "Employers must provide injury insurance.",
                "answer": true,
                "points": 5
            }
        ]
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_exam(&self, body: &Value) -> String {
        let response = self
            .client
            .post(self.url("/api/admin/exams"))
            .bearer_auth(admin_token())
            .json(body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Assigns `exam_id` to the students and returns the new assignment ids.
    pub async fn assign(&self, exam_id: &str, student_ids: &[&str]) -> Vec<String> {
        let response = self
            .client
            .post(self.url("/api/admin/assignments"))
            .bearer_auth(admin_token())
            .json(&json!({ "exam_id": exam_id, "student_ids": student_ids }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["assignment_ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|id| id.as_str().unwrap().to_string())
            .collect()
    }

    pub async fn submit(&self, student_id: &str, assignment_id: &str, answers: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/student/submit"))
            .bearer_auth(token_for(student_id, Role::Student))
            .json(&json!({ "assignment_id": assignment_id, "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
