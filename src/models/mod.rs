// src/models/mod.rs

pub mod cluster;
pub mod exam;
pub mod exam_result;
