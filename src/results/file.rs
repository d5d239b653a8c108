// src/results/file.rs

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::exam_result::{AttemptResult, ExamResult, NewAttempt},
};

use super::ResultStore;

/// Stores attempts as one JSON array file, rewritten on every append.
///
/// Entries written by older front ends (`{examId, examResult}` without an id)
/// are still readable; they get their 1-based position as id.
pub struct JsonFileResultStore {
    path: PathBuf,
    /// Serializes the read-modify-write cycle of `append`.
    write_lock: Mutex<()>,
}

impl JsonFileResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_entries(&self) -> Result<Vec<Value>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::StorageUnavailable(e.to_string())),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice::<Vec<Value>>(&bytes).map_err(|e| {
            AppError::StorageUnavailable(format!(
                "Results file {} is not a JSON array: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<(), AppError> {
        let data = serde_json::to_vec_pretty(entries)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ResultStore for JsonFileResultStore {
    async fn append(&self, attempt: NewAttempt) -> Result<i64, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_entries().await?;
        let next_id = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_id(index, entry))
            .max()
            .unwrap_or(0)
            + 1;

        let stored = AttemptResult {
            id: next_id,
            exam_id: attempt.exam_id,
            exam_name: attempt.exam_name,
            exam_result: attempt.result,
        };
        entries.push(
            serde_json::to_value(&stored)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        );

        self.write_entries(&entries).await?;
        Ok(next_id)
    }

    async fn list(&self) -> Result<Vec<AttemptResult>, AppError> {
        let entries = self.read_entries().await?;

        let mut results: Vec<AttemptResult> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let decoded = decode_entry(index, entry);
                if decoded.is_none() {
                    tracing::warn!("Skipping unreadable result entry at position {}", index + 1);
                }
                decoded
            })
            .collect();

        super::sort_newest_first(&mut results);
        Ok(results)
    }
}

fn entry_id(index: usize, entry: &Value) -> i64 {
    entry
        .get("id")
        .and_then(Value::as_i64)
        .unwrap_or(index as i64 + 1)
}

/// Accepts a millisecond epoch or an RFC 3339 string.
fn decode_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

/// Decodes one stored entry. Malformed `answers` / `incorrectQuestions` become empty;
/// an entry without an exam id or result body is unreadable.
fn decode_entry(index: usize, entry: &Value) -> Option<AttemptResult> {
    let exam_id = entry.get("examId")?.as_str()?.to_string();
    let body = entry.get("examResult")?.as_object()?;
    let int = |key: &str| body.get(key).and_then(Value::as_i64).unwrap_or(0);

    let answers = body
        .get("answers")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let incorrect_questions = body
        .get("incorrectQuestions")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Some(AttemptResult {
        id: entry_id(index, entry),
        exam_name: entry
            .get("examName")
            .and_then(Value::as_str)
            .unwrap_or(exam_id.as_str())
            .to_string(),
        exam_id,
        exam_result: ExamResult {
            timestamp: decode_timestamp(body.get("timestamp")).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            score: int("score"),
            total: int("total"),
            time: int("time"),
            answers,
            incorrect_questions,
            is_retake: body.get("isRetake").and_then(Value::as_bool).unwrap_or(false),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam_result::Answers;
    use serde_json::json;

    fn attempt(exam: &str, ms: i64, score: i64) -> NewAttempt {
        NewAttempt {
            exam_id: exam.to_string(),
            exam_name: exam.to_string(),
            result: ExamResult {
                timestamp: Utc.timestamp_millis_opt(ms).unwrap(),
                score,
                total: 10,
                time: 120,
                answers: Answers::new(),
                incorrect_questions: vec!["Q3".into()],
                is_retake: false,
            },
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResultStore::new(dir.path().join("results.json"));

        assert!(store.list().await.unwrap().is_empty());

        let first = store.append(attempt("A", 1_000, 5)).await.unwrap();
        let second = store.append(attempt("A", 3_000, 7)).await.unwrap();
        let third = store.append(attempt("B", 2_000, 9)).await.unwrap();
        assert!(first < second && second < third);

        let listed = store.list().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, third, first]);
        assert_eq!(listed[0].exam_result.incorrect_questions, vec!["Q3"]);
    }

    #[tokio::test]
    async fn test_reads_legacy_entries_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let legacy = json!([
            {"examId": "Old", "examResult": {"timestamp": 5_000, "score": 4, "total": 5, "time": 10,
                                             "answers": {"Q1": "A"}, "incorrectQuestions": ["Q2"]}},
            {"examId": "Old", "examResult": {"timestamp": 6_000, "score": 1, "total": 5, "time": 10,
                                             "answers": "garbage", "incorrectQuestions": 3}},
            {"nothing": true}
        ]);
        std::fs::write(&path, serde_json::to_vec(&legacy).unwrap()).unwrap();

        let store = JsonFileResultStore::new(&path);
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, 2);
        assert!(listed[0].exam_result.answers.is_empty());
        assert!(listed[0].exam_result.incorrect_questions.is_empty());
        assert_eq!(listed[1].exam_result.answers.len(), 1);

        // Positional ids of legacy entries are respected by the next append.
        let id = store.append(attempt("Old", 7_000, 5)).await.unwrap();
        assert_eq!(id, 4);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, b"{ not an array").unwrap();

        let store = JsonFileResultStore::new(&path);
        let err = store.append(attempt("A", 1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not an array");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFileResultStore::new(dir.path().join("results.json")));

        let handles: Vec<_> = (0..25)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.append(attempt("A", n * 1_000, 5)).await })
            })
            .collect();

        let mut ids = std::collections::BTreeSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(ids.len(), 25);
        assert_eq!(store.list().await.unwrap().len(), 25);
    }
}
