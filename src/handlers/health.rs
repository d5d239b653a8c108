// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{config::Config, error::AppError};

/// Reports whether the database answers and where exams and results live.
pub async fn health(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "examsDir": config.exams_dir.display().to_string(),
        "resultsBackend": format!("{:?}", config.results_backend).to_lowercase(),
    })))
}
