// src/models/exam_result.rs

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::exam::Selection;

/// Question id to the key(s) the candidate submitted.
pub type Answers = BTreeMap<String, Selection>;

/// One stored attempt, in the `{examId, examResult}` shape the front end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub id: i64,

    /// Exam display name. History is keyed by name, so renaming an exam orphans it.
    pub exam_id: String,

    #[serde(default)]
    pub exam_name: String,

    pub exam_result: ExamResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    /// Milliseconds since the epoch on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub score: i64,

    /// Question count, or the sum of correct-choice counts for multi-answer exams.
    pub total: i64,

    /// Elapsed seconds.
    pub time: i64,

    #[serde(default)]
    pub answers: Answers,

    #[serde(default)]
    pub incorrect_questions: Vec<String>,

    #[serde(default)]
    pub is_retake: bool,
}

impl AttemptResult {
    /// Score as a percentage of total; 0 when total is 0.
    pub fn percentage(&self) -> f64 {
        self.exam_result.percentage()
    }
}

impl ExamResult {
    pub fn percentage(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        self.score as f64 / self.total as f64 * 100.0
    }
}

/// Represents the 'exam_results' table in the database.
/// `answers` and `incorrect_questions` are JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct ExamResultRow {
    pub id: i64,
    pub exam_id: String,
    pub exam_name: String,
    pub score: i64,
    pub total: i64,
    pub time_taken: i64,
    pub answers: String,
    pub incorrect_questions: String,
    pub is_retake: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<ExamResultRow> for AttemptResult {
    /// Malformed JSON columns decode to empty collections.
    fn from(row: ExamResultRow) -> Self {
        let answers = serde_json::from_str(&row.answers).unwrap_or_else(|e| {
            tracing::warn!("Result {} has malformed answers, using empty map: {}", row.id, e);
            Answers::new()
        });
        let incorrect_questions = serde_json::from_str(&row.incorrect_questions)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Result {} has malformed incorrect_questions, using empty list: {}",
                    row.id,
                    e
                );
                Vec::new()
            });

        AttemptResult {
            id: row.id,
            exam_id: row.exam_id,
            exam_name: row.exam_name,
            exam_result: ExamResult {
                timestamp: row.timestamp,
                score: row.score,
                total: row.total,
                time: row.time_taken,
                answers,
                incorrect_questions,
                is_retake: row.is_retake,
            },
        }
    }
}

/// DTO for saving an attempt, matching what the front end posts.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultRequest {
    #[validate(length(min = 1, max = 500))]
    pub exam_id: String,

    /// Defaults to `exam_id` when absent.
    pub exam_name: Option<String>,

    #[validate(nested)]
    pub exam_result: NewExamResult,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewExamResult {
    /// Milliseconds since the epoch; the server clock is used when absent.
    pub timestamp: Option<i64>,

    #[validate(range(min = 0))]
    pub score: i64,

    #[validate(range(min = 0))]
    pub total: i64,

    #[validate(range(min = 0))]
    pub time: i64,

    #[serde(default)]
    pub answers: Answers,

    #[serde(default)]
    pub incorrect_questions: Vec<String>,

    #[serde(default)]
    pub is_retake: bool,
}

/// An attempt ready to be appended to a result store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub exam_id: String,
    pub exam_name: String,
    pub result: ExamResult,
}

impl SaveResultRequest {
    pub fn into_attempt(self) -> NewAttempt {
        let timestamp = self
            .exam_result
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);
        let exam_name = self.exam_name.unwrap_or_else(|| self.exam_id.clone());

        NewAttempt {
            exam_id: self.exam_id,
            exam_name,
            result: ExamResult {
                timestamp,
                score: self.exam_result.score,
                total: self.exam_result.total,
                time: self.exam_result.time,
                answers: self.exam_result.answers,
                incorrect_questions: self.exam_result.incorrect_questions,
                is_retake: self.exam_result.is_retake,
            },
        }
    }
}

/// Response to a successful save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultResponse {
    pub success: bool,
    pub id: i64,
    pub percentage: f64,
    pub previous_best: f64,
    pub is_new_best: bool,
}
