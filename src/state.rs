use std::sync::Arc;

use crate::catalog::ExamCatalog;
use crate::config::{Config, ResultsBackend};
use crate::results::{JsonFileResultStore, ResultStore, SqliteResultStore};
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub catalog: Arc<ExamCatalog>,
    pub results: Arc<dyn ResultStore>,
}

impl AppState {
    /// Builds the catalog and the configured result store around `pool`.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let catalog = Arc::new(ExamCatalog::new(pool.clone(), config.exams_dir.clone()));
        let results: Arc<dyn ResultStore> = match config.results_backend {
            ResultsBackend::Sqlite => Arc::new(SqliteResultStore::new(pool.clone())),
            ResultsBackend::File => Arc::new(JsonFileResultStore::new(config.results_file.clone())),
        };

        Self {
            pool,
            config,
            catalog,
            results,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ExamCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ResultStore> {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}
