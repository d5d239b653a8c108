// tests/catalog_tests.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use exam_sim::{catalog::ExamCatalog, db, error::AppError};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exams")).unwrap();

    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
    let pool = db::connect(&url).await.expect("Failed to open test database");
    db::migrate(&pool).await.expect("Failed to migrate database");

    (dir, pool)
}

fn exam_json(id: &str, name: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "examInfo": {"id": id, "name": name, "totalQuestions": 1, "totalTime": 5},
        "domains": [{
            "domain": "Only",
            "questions": [{"question": "?", "choices": {"A": "a"}, "correct_choice": "A"}]
        }]
    }))
    .unwrap()
}

#[tokio::test]
async fn sync_fails_when_directory_is_missing() {
    let (dir, pool) = setup().await;
    let catalog = ExamCatalog::new(pool, dir.path().join("does_not_exist"));

    let err = catalog.sync().await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn case_variants_share_one_cluster() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    std::fs::write(exams.join("1.json"), exam_json("one", "cloud BASICS practice")).unwrap();
    std::fs::write(exams.join("2.json"), exam_json("two", "Cloud Basics Mock Test")).unwrap();

    let catalog = ExamCatalog::new(pool, &exams);
    let report = catalog.sync().await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.touched_clusters, 1);
    assert_eq!(report.clusters, 1);

    let clusters = catalog.list_clusters().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].id, "cloud_basics");
    assert_eq!(clusters[0].title, "Cloud Basics");
    assert_eq!(clusters[0].exams.len(), 2);
}

#[tokio::test]
async fn exams_without_id_use_file_stem() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    std::fs::write(exams.join("stemmed.json"), exam_json("", "Stem Exam")).unwrap();

    let catalog = ExamCatalog::new(pool, &exams);
    catalog.sync().await.unwrap();

    let found = catalog.find_exam("stemmed").await.unwrap().expect("exam by stem");
    assert_eq!(found.name, "Stem Exam");
    assert_eq!(found.total_time, Some(5));
    assert!(!found.file_hash.is_empty());
}

#[tokio::test]
async fn all_noise_names_share_fallback_cluster() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    std::fs::write(exams.join("a.json"), exam_json("a", "Practice Exam 1")).unwrap();
    std::fs::write(exams.join("b.json"), exam_json("b", "Mock Test v2")).unwrap();

    let catalog = ExamCatalog::new(pool, &exams);
    catalog.sync().await.unwrap();

    let clusters = catalog.list_clusters().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].id, "(uncategorized)");
    assert_eq!(clusters[0].title, "Uncategorized");
}

#[tokio::test]
async fn retake_distinguishes_missing_exam_from_broken_file() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    std::fs::write(exams.join("ok.json"), exam_json("ok", "Working Exam")).unwrap();

    let catalog = ExamCatalog::new(pool, &exams);
    catalog.sync().await.unwrap();

    let missing = catalog
        .create_retake("unknown", &["Q1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    // File corrupted after the last sync.
    std::fs::write(exams.join("ok.json"), b"[1, 2").unwrap();
    let broken = catalog
        .create_retake("ok", &["Q1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(broken, AppError::ParseError(_)));
}

#[tokio::test]
async fn load_exam_rejects_paths_outside_the_bank() {
    let (dir, pool) = setup().await;
    std::fs::write(dir.path().join("secret.json"), exam_json("s", "Secret")).unwrap();

    let catalog = ExamCatalog::new(pool, dir.path().join("exams"));
    let err = catalog.load_exam("../secret.json").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn resync_replaces_cluster_title() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    let path = exams.join("foo.json");
    std::fs::write(&path, exam_json("foo", "Foo_Bar Practice")).unwrap();

    let catalog = ExamCatalog::new(pool, &exams);
    catalog.sync().await.unwrap();
    let clusters = catalog.list_clusters().await.unwrap();
    assert_eq!(clusters[0].id, "foo_bar");
    assert_eq!(clusters[0].title, "Foo_bar");

    // Same key, different title.
    std::fs::write(&path, exam_json("foo", "Foo Bar Mock")).unwrap();
    let report = catalog.sync().await.unwrap();
    assert_eq!(report.processed, 1);

    let clusters = catalog.list_clusters().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].id, "foo_bar");
    assert_eq!(clusters[0].title, "Foo Bar");

    let mtime: DateTime<Utc> = std::fs::metadata(&path).unwrap().modified().unwrap().into();
    let stored = clusters[0].exams[0].last_modified;
    assert!((stored - mtime).num_milliseconds().abs() < 1_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_syncs_process_each_file_once() {
    let (dir, pool) = setup().await;
    let exams = dir.path().join("exams");
    for n in 0..20 {
        let name = format!("Subject {} Practice", n);
        std::fs::write(exams.join(format!("{}.json", n)), exam_json(&n.to_string(), &name)).unwrap();
    }

    let catalog = Arc::new(ExamCatalog::new(pool, &exams));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.sync().await })
        })
        .collect();

    let mut processed = 0;
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        processed += report.processed;
    }
    assert_eq!(processed, 20);
    assert_eq!(catalog.list_exams_flat().await.unwrap().len(), 20);
}
