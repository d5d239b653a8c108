// src/results/sqlite.rs

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::exam_result::{AttemptResult, ExamResultRow, NewAttempt},
};

use super::ResultStore;

const RESULT_COLUMNS: &str = r#"
    id, exam_id, exam_name, score, total, time_taken,
    answers, incorrect_questions, is_retake, timestamp
"#;

/// Stores attempts in the `exam_results` table.
#[derive(Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn append(&self, attempt: NewAttempt) -> Result<i64, AppError> {
        let answers = serde_json::to_string(&attempt.result.answers)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        let incorrect = serde_json::to_string(&attempt.result.incorrect_questions)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO exam_results
            (exam_id, exam_name, score, total, time_taken, answers, incorrect_questions, is_retake, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&attempt.exam_id)
        .bind(&attempt.exam_name)
        .bind(attempt.result.score)
        .bind(attempt.result.total)
        .bind(attempt.result.time)
        .bind(answers)
        .bind(incorrect)
        .bind(attempt.result.is_retake)
        .bind(attempt.result.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam result: {:?}", e);
            AppError::from(e)
        })?;

        Ok(id)
    }

    async fn list(&self) -> Result<Vec<AttemptResult>, AppError> {
        let rows = sqlx::query_as::<_, ExamResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(into_attempts(rows))
    }

    async fn list_for_exam(&self, exam_id: &str) -> Result<Vec<AttemptResult>, AppError> {
        let rows = sqlx::query_as::<_, ExamResultRow>(&format!(
            r#"
            SELECT {RESULT_COLUMNS} FROM exam_results
            WHERE exam_id = ?
            ORDER BY timestamp DESC, id DESC
            "#
        ))
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_attempts(rows))
    }
}

/// Text timestamps from other writers may not sort lexically, so order again in memory.
fn into_attempts(rows: Vec<ExamResultRow>) -> Vec<AttemptResult> {
    let mut results: Vec<AttemptResult> = rows.into_iter().map(AttemptResult::from).collect();
    super::sort_newest_first(&mut results);
    results
}
