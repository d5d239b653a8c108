// src/handlers/mod.rs

pub mod exams;
pub mod health;
pub mod results;
