// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam_result::{SaveResultRequest, SaveResultResponse},
    results::{
        ResultStore,
        stats::{best_score_excluding, history_summary},
    },
};

/// Query parameters for listing results.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub exam_id: Option<String>,
}

/// Query parameters for a history summary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub exam_id: String,
}

/// Lists attempts newest first, optionally for one exam.
pub async fn list_results(
    State(store): State<Arc<dyn ResultStore>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let results = match params.exam_id.as_deref() {
        Some(exam_id) => store.list_for_exam(exam_id).await?,
        None => store.list().await?,
    };
    Ok(Json(results))
}

/// Appends an attempt.
///
/// The response says whether the attempt beats every earlier attempt of the same exam.
pub async fn save_result(
    State(store): State<Arc<dyn ResultStore>>,
    Json(req): Json<SaveResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let attempt = req.into_attempt();
    let exam_id = attempt.exam_id.clone();
    let percentage = attempt.result.percentage();

    let id = store.append(attempt).await?;

    let history = store.list_for_exam(&exam_id).await?;
    let previous_best = best_score_excluding(&history, &exam_id, Some(id));

    tracing::info!(
        "Saved result {} for '{}': {:.1}% (previous best {:.1}%)",
        id,
        exam_id,
        percentage,
        previous_best
    );

    Ok(Json(SaveResultResponse {
        success: true,
        id,
        percentage,
        previous_best,
        is_new_best: percentage > previous_best,
    }))
}

/// Attempt count, average, best and the recent trend for one exam.
pub async fn results_summary(
    State(store): State<Arc<dyn ResultStore>>,
    Query(params): Query<SummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    let history = store.list_for_exam(&params.exam_id).await?;
    Ok(Json(history_summary(&history, &params.exam_id)))
}
