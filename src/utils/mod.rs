// src/utils/mod.rs

pub mod grading;
pub mod hash;
