// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Allowed shape for user ids and login accounts.
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("identifier regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    Active,
    Frozen,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    /// Unique login account.
    pub account: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub role: Role,

    pub status: UserStatus,

    /// Display name.
    #[serde(rename = "name")]
    pub real_name: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub account: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Returned by a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: String,
    pub account: String,
    pub role: Role,
    pub name: String,
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
}

/// DTO for an administrator creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64), custom(function = validate_identifier))]
    pub id: String,
    #[validate(length(
        min = 3,
        max = 64,
        message = "Account length must be between 3 and 64 characters."
    ), custom(function = validate_identifier))]
    pub account: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub account: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.account.is_none()
            && self.role.is_none()
            && self.status.is_none()
            && self.name.is_none()
            && self.password.is_none()
    }
}

pub fn validate_identifier(value: &str) -> Result<(), validator::ValidationError> {
    if !IDENTIFIER_RE.is_match(value) {
        return Err(validator::ValidationError::new("invalid_identifier"));
    }
    Ok(())
}
