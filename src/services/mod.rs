// src/services/mod.rs

pub mod audit;
pub mod grader;
pub mod report;
pub mod submission;
