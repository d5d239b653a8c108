// src/config.rs

use std::env;
use std::path::PathBuf;
use dotenvy::dotenv;

/// Suffix appended to the display name of a derived retake exam.
pub const RETAKE_SUFFIX: &str = " (Retake)";

/// Only files with this extension in the exam bank are treated as exam records.
pub const EXAM_FILE_EXTENSION: &str = "json";

/// Number of most recent attempts reported in a history summary.
pub const HISTORY_RECENT_ATTEMPTS: usize = 5;

/// Window size of the trailing moving average in a history summary.
pub const HISTORY_MOVING_AVERAGE_WINDOW: usize = 3;

/// Where attempt history is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsBackend {
    /// `exam_results` table in the application database.
    Sqlite,
    /// A single JSON array file, rewritten on every append.
    File,
}

impl ResultsBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" | "database" => Some(Self::Sqlite),
            "file" | "json" => Some(Self::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub exams_dir: PathBuf,
    pub static_dir: PathBuf,
    pub results_backend: ResultsBackend,
    pub results_file: PathBuf,
    pub bind_addr: String,
    pub log_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://exam_sim.db".to_string());

        let exams_dir = env::var("EXAMS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("examsBank"));

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        let results_backend = match env::var("RESULTS_BACKEND") {
            Ok(value) => ResultsBackend::parse(&value).unwrap_or_else(|| {
                eprintln!("Unknown RESULTS_BACKEND '{}', falling back to sqlite", value);
                ResultsBackend::Sqlite
            }),
            Err(_) => ResultsBackend::Sqlite,
        };

        let results_file = env::var("RESULTS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("exam_results.json"));

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            exams_dir,
            static_dir,
            results_backend,
            results_file,
            bind_addr,
            log_dir,
            rust_log,
        }
    }
}
