// src/results/mod.rs

//! Attempt history. Two interchangeable backends behind [`ResultStore`]:
//! the `exam_results` table and a flat JSON file.

pub mod file;
pub mod sqlite;
pub mod stats;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::exam_result::{AttemptResult, NewAttempt},
};

pub use file::JsonFileResultStore;
pub use sqlite::SqliteResultStore;

/// Append-only store of exam attempts.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Appends an attempt and returns its id. Ids increase per store.
    async fn append(&self, attempt: NewAttempt) -> Result<i64, AppError>;

    /// All attempts, newest first.
    async fn list(&self) -> Result<Vec<AttemptResult>, AppError>;

    /// Attempts for one exam, newest first.
    async fn list_for_exam(&self, exam_id: &str) -> Result<Vec<AttemptResult>, AppError> {
        let mut results = self.list().await?;
        results.retain(|r| r.exam_id == exam_id);
        Ok(results)
    }
}

/// Newest first by timestamp; later ids first on ties.
pub(crate) fn sort_newest_first(results: &mut [AttemptResult]) {
    results.sort_by(|a, b| {
        b.exam_result
            .timestamp
            .cmp(&a.exam_result.timestamp)
            .then(b.id.cmp(&a.id))
    });
}
