// src/handlers/mod.rs

pub mod assignments;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod exams;
pub mod records;
pub mod student;
pub mod users;
