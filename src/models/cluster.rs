// src/models/cluster.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'exams' table: one exam file with its metadata copied out of `examInfo`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    /// `examInfo.id` from the file (or the file stem when the file has none).
    #[serde(rename = "id")]
    pub exam_id: String,

    /// File name inside the exam bank directory, used to load the full record.
    #[serde(rename = "file")]
    pub file_name: String,

    pub cluster_id: String,

    pub name: String,

    pub description: Option<String>,

    pub difficulty: Option<String>,

    pub total_questions: i64,

    /// Minutes; `None` means untimed.
    pub total_time: Option<i64>,

    pub domain_distribution: Json<Map<String, Value>>,

    /// SHA-256 of the file bytes at the last sync.
    #[serde(skip)]
    pub file_hash: String,

    pub last_modified: DateTime<Utc>,
}

/// A group of exam variants sharing a normalized base name.
/// Only clusters with at least one exam are ever built.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub id: String,
    pub title: String,
    /// Ordered by exam name.
    pub exams: Vec<ExamSummary>,
}

/// Row of the clusters/exams join used to build [`Cluster`] listings.
#[derive(Debug, FromRow)]
pub struct ClusterExamRow {
    pub cluster_title: String,
    #[sqlx(flatten)]
    pub exam: ExamSummary,
}

/// Result of one catalog sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Files parsed and upserted in this run.
    pub processed: usize,
    /// Non-empty clusters in the catalog after this run.
    pub clusters: usize,
    /// Distinct clusters upserted in this run.
    pub touched_clusters: usize,
    /// Files whose fingerprint matched the stored one.
    pub skipped: usize,
    /// Files that could not be read or parsed.
    pub failed: usize,
    /// Exam rows deregistered because their file disappeared.
    pub removed: usize,
}
