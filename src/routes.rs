// src/routes.rs

use std::path::Path;

use axum::{
    Router,
    http::{Method, StatusCode, Uri, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{exams, health, results},
    state::AppState,
};

/// Assembles the main application router.
///
/// * `/api/...` routes for the catalog, retakes, grading and results.
/// * Aliases under the paths the legacy front end calls.
/// * Static front end from `config.static_dir`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let exam_routes = Router::new()
        .route("/", get(exams::list_exams))
        .route("/sync", post(exams::sync_exams))
        .route("/retake", post(exams::create_retake))
        .route("/grade", post(exams::grade_exam))
        .route("/{file}", get(exams::get_exam));

    let result_routes = Router::new()
        .route("/", get(results::list_results).post(results::save_result))
        .route("/summary", get(results::results_summary));

    // Paths used by the legacy front end.
    let legacy_routes = Router::new()
        .route("/getExams", get(exams::list_exams))
        .route("/getExamClusters", get(exams::list_clusters))
        .route("/examsBank/{file}", get(exams::get_exam))
        .route("/syncExamFiles", post(exams::sync_exams))
        .route("/createRetakeExam", post(exams::create_retake))
        .route("/getExamResults", get(results::list_results))
        .route("/saveExamResult", post(results::save_result));

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/clusters", get(exams::list_clusters))
        .nest("/api/exams", exam_routes)
        .nest("/api/results", result_routes)
        .merge(legacy_routes)
        .merge(static_routes(&static_dir))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// `/static/*` from the static directory, `/` and `/index.html` from its index page.
/// Source map requests are answered with 404 without touching the disk.
fn static_routes(static_dir: &Path) -> Router<AppState> {
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route_service("/", index.clone())
        .route_service("/index.html", index)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> (StatusCode, axum::Json<serde_json::Value>) {
    let message = if uri.path().ends_with(".map") {
        "Source maps are not served"
    } else {
        "File not found"
    };
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": message })),
    )
}
