// src/models/mod.rs

pub mod assignment;
pub mod audit_log;
pub mod course;
pub mod exam;
pub mod record;
pub mod user;
