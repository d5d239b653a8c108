// src/catalog/mod.rs

//! The exam catalog: exam files on disk mirrored into the `clusters` and
//! `exams` tables, re-synced by content fingerprint.

pub mod cluster_key;
pub mod retake;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, types::Json};
use tokio::sync::Mutex;

use crate::{
    config::EXAM_FILE_EXTENSION,
    error::AppError,
    models::{
        cluster::{Cluster, ClusterExamRow, ExamSummary, SyncReport},
        exam::ExamRecord,
    },
    utils::hash::fingerprint,
};

use self::cluster_key::ClusterKey;

const EXAM_COLUMNS: &str = r#"
    e.exam_id, e.cluster_id, e.file_name, e.name, e.description, e.difficulty,
    e.total_questions, e.total_time, e.domain_distribution, e.file_hash, e.last_modified
"#;

/// Owns the exam bank directory and its database mirror.
/// Constructed once at startup and shared through `AppState`.
pub struct ExamCatalog {
    pool: SqlitePool,
    exams_dir: PathBuf,
    /// Serializes syncs so two scans never interleave their upserts.
    sync_lock: Mutex<()>,
}

/// Helper struct for fetching stored fingerprints.
#[derive(sqlx::FromRow)]
struct StoredFingerprint {
    file_name: String,
    file_hash: String,
}

impl ExamCatalog {
    pub fn new(pool: SqlitePool, exams_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            exams_dir: exams_dir.into(),
            sync_lock: Mutex::new(()),
        }
    }

    /// Re-scans the exam directory and upserts every new or changed file.
    ///
    /// * Files whose fingerprint matches the stored one are skipped.
    /// * Unreadable or malformed files are logged and skipped.
    /// * Rows whose file has disappeared are deregistered.
    /// * Fails as a whole only when the directory is missing or the database is unreachable.
    pub async fn sync(&self) -> Result<SyncReport, AppError> {
        let _guard = self.sync_lock.lock().await;

        let files = self.exam_files().await?;

        let stored: HashMap<String, String> = sqlx::query_as::<_, StoredFingerprint>(
            "SELECT file_name, file_hash FROM exams",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| (row.file_name, row.file_hash))
        .collect();

        let mut report = SyncReport::default();
        let mut touched: BTreeSet<String> = BTreeSet::new();

        for (file_name, path) in &files {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Skipping unreadable exam file {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            let hash = fingerprint(&bytes);
            if stored.get(file_name) == Some(&hash) {
                tracing::debug!("Exam file {} unchanged, skipping", file_name);
                report.skipped += 1;
                continue;
            }

            let exam = match ExamRecord::from_slice(&bytes) {
                Ok(exam) => exam,
                Err(e) => {
                    tracing::warn!("Skipping malformed exam file {}: {}", file_name, e);
                    report.failed += 1;
                    continue;
                }
            };

            let modified = modified_time(path).await;
            let cluster = ClusterKey::from_name(&exam.exam_info.name);
            self.upsert_exam(file_name, &exam, &cluster, &hash, modified)
                .await?;

            tracing::debug!(
                "Synced exam file {} into cluster '{}'",
                file_name,
                cluster.key
            );
            touched.insert(cluster.key);
            report.processed += 1;
        }

        let present: HashSet<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
        for file_name in stored.keys().filter(|name| !present.contains(name.as_str())) {
            sqlx::query("DELETE FROM exams WHERE file_name = ?")
                .bind(file_name)
                .execute(&self.pool)
                .await?;
            tracing::info!("Deregistered exam file {} (no longer on disk)", file_name);
            report.removed += 1;
        }

        report.touched_clusters = touched.len();
        report.clusters = self.cluster_count().await?;

        tracing::info!(
            "Exam catalog sync: {} processed, {} skipped, {} failed, {} removed, {} clusters",
            report.processed,
            report.skipped,
            report.failed,
            report.removed,
            report.clusters
        );

        Ok(report)
    }

    /// Clusters with at least one exam, ordered by title, exams ordered by name.
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>, AppError> {
        let rows = sqlx::query_as::<_, ClusterExamRow>(&format!(
            r#"
            SELECT c.title AS cluster_title, {EXAM_COLUMNS}
            FROM clusters c
            JOIN exams e ON e.cluster_id = c.id
            ORDER BY c.title, c.id, e.name, e.file_name
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut clusters: Vec<Cluster> = Vec::new();
        for row in rows {
            if let Some(cluster) = clusters
                .last_mut()
                .filter(|c| c.id == row.exam.cluster_id)
            {
                cluster.exams.push(row.exam);
                continue;
            }
            clusters.push(Cluster {
                id: row.exam.cluster_id.clone(),
                title: row.cluster_title,
                exams: vec![row.exam],
            });
        }

        Ok(clusters)
    }

    /// Every known exam, ordered by name.
    pub async fn list_exams_flat(&self) -> Result<Vec<ExamSummary>, AppError> {
        let exams = sqlx::query_as::<_, ExamSummary>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams e ORDER BY e.name, e.file_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(exams)
    }

    /// Looks an exam up by catalog id, falling back to its display name.
    pub async fn find_exam(&self, exam_id: &str) -> Result<Option<ExamSummary>, AppError> {
        let exam = sqlx::query_as::<_, ExamSummary>(&format!(
            r#"
            SELECT {EXAM_COLUMNS}
            FROM exams e
            WHERE e.exam_id = ?1 OR e.name = ?1
            ORDER BY (e.exam_id = ?1) DESC, e.file_name
            LIMIT 1
            "#
        ))
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    /// Loads one exam file from the bank with positional question ids assigned.
    pub async fn load_exam(&self, file_name: &str) -> Result<ExamRecord, AppError> {
        let path = self.resolve_file(file_name)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::NotFound(format!("Exam file '{}' not found", file_name))
            }
            _ => AppError::from(e),
        })?;

        let mut exam = ExamRecord::from_slice(&bytes).map_err(|e| {
            AppError::ParseError(format!("Exam file '{}' is malformed: {}", file_name, e))
        })?;
        exam.assign_question_ids();

        Ok(exam)
    }

    /// Resolves an exam by id or name and loads its record.
    pub async fn load_exam_by_id(&self, exam_id: &str) -> Result<ExamRecord, AppError> {
        let summary = self
            .find_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam '{}' not found", exam_id)))?;

        self.load_exam(&summary.file_name).await
    }

    /// Derives a retake exam restricted to `question_ids`.
    pub async fn create_retake(
        &self,
        exam_id: &str,
        question_ids: &[String],
    ) -> Result<ExamRecord, AppError> {
        let original = self.load_exam_by_id(exam_id).await?;
        let retake = retake::derive_retake(&original, question_ids);

        tracing::info!(
            "Created retake of '{}' with {} questions",
            original.exam_info.name,
            retake.exam_info.total_questions
        );

        Ok(retake)
    }

    /// Only bare file names inside the exam directory are accepted.
    fn resolve_file(&self, file_name: &str) -> Result<PathBuf, AppError> {
        let is_bare = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !is_bare {
            return Err(AppError::NotFound(format!("Exam file '{}' not found", file_name)));
        }
        Ok(self.exams_dir.join(file_name))
    }

    /// Lists `*.json` files in the exam directory, sorted by name.
    async fn exam_files(&self) -> Result<Vec<(String, PathBuf)>, AppError> {
        let mut entries = tokio::fs::read_dir(&self.exams_dir).await.map_err(|e| {
            match e.kind() {
                std::io::ErrorKind::NotFound => AppError::NotFound(format!(
                    "Exam directory '{}' not found",
                    self.exams_dir.display()
                )),
                _ => AppError::from(e),
            }
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_exam = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(EXAM_FILE_EXTENSION));
            if !is_exam || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push((name.to_string(), path.clone()));
            }
        }

        files.sort();
        Ok(files)
    }

    /// Upserts the cluster (title replaced every time) and the exam row in one transaction.
    async fn upsert_exam(
        &self,
        file_name: &str,
        exam: &ExamRecord,
        cluster: &ClusterKey,
        hash: &str,
        modified: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let info = &exam.exam_info;
        let exam_id = if info.id.is_empty() {
            file_stem(file_name)
        } else {
            info.id.clone()
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO clusters (id, title)
            VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET title = excluded.title
            "#,
        )
        .bind(&cluster.key)
        .bind(&cluster.title)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO exams
            (exam_id, cluster_id, file_name, name, description, difficulty,
             total_questions, total_time, domain_distribution, file_hash, last_modified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(file_name) DO UPDATE SET
                exam_id = excluded.exam_id,
                cluster_id = excluded.cluster_id,
                name = excluded.name,
                description = excluded.description,
                difficulty = excluded.difficulty,
                total_questions = excluded.total_questions,
                total_time = excluded.total_time,
                domain_distribution = excluded.domain_distribution,
                file_hash = excluded.file_hash,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(exam_id)
        .bind(&cluster.key)
        .bind(file_name)
        .bind(&info.name)
        .bind(&info.description)
        .bind(&info.difficulty)
        .bind(info.total_questions as i64)
        .bind(info.total_time.map(i64::from))
        .bind(Json(&info.domain_distribution))
        .bind(hash)
        .bind(modified)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn cluster_count(&self) -> Result<usize, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT cluster_id) FROM exams")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

async fn modified_time(path: &Path) -> DateTime<Utc> {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(time) => DateTime::<Utc>::from(time),
        Err(e) => {
            tracing::warn!("No modification time for {}: {}", path.display(), e);
            Utc::now()
        }
    }
}
