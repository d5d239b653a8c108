// src/handlers/exams.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    catalog::ExamCatalog,
    error::AppError,
    models::exam::{GradeRequest, RetakeRequest},
    utils::grading::grade,
};

/// Lists every exam in the catalog as a flat list (the shape of the old `/getExams`).
pub async fn list_exams(
    State(catalog): State<Arc<ExamCatalog>>,
) -> Result<impl IntoResponse, AppError> {
    let exams = catalog.list_exams_flat().await?;
    Ok(Json(exams))
}

/// Lists non-empty clusters with their exams.
pub async fn list_clusters(
    State(catalog): State<Arc<ExamCatalog>>,
) -> Result<impl IntoResponse, AppError> {
    let clusters = catalog.list_clusters().await?;
    Ok(Json(clusters))
}

/// Returns one exam record by file name, with positional question ids filled in.
pub async fn get_exam(
    State(catalog): State<Arc<ExamCatalog>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = catalog.load_exam(&file_name).await?;
    Ok(Json(exam))
}

/// Re-scans the exam bank directory.
pub async fn sync_exams(
    State(catalog): State<Arc<ExamCatalog>>,
) -> Result<impl IntoResponse, AppError> {
    let report = catalog.sync().await?;
    Ok(Json(report))
}

/// Builds a retake exam from the questions a previous attempt got wrong.
///
/// * `examId` may be the catalog id or the display name.
/// * Unknown exams yield 404.
pub async fn create_retake(
    State(catalog): State<Arc<ExamCatalog>>,
    Json(req): Json<RetakeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let retake = catalog
        .create_retake(&req.exam_id, &req.incorrect_question_ids)
        .await?;

    Ok(Json(retake))
}

/// Grades a submission against the stored answer key.
pub async fn grade_exam(
    State(catalog): State<Arc<ExamCatalog>>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let exam = catalog.load_exam_by_id(&req.exam_id).await?;
    Ok(Json(grade(&exam, &req.answers)))
}
