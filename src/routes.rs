// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, submission},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the exam and submission sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, scoring table).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    let exam_routes = Router::new()
        .route("/", post(exam::create_exam))
        .route("/{id}", get(exam::get_exam).put(exam::update_exam))
        .route("/{id}/publish", post(exam::publish_exam))
        .route("/{id}/allocation", get(exam::get_allocation))
        .route("/{id}/submissions", post(submission::create_submission));

    let submission_routes = Router::new()
        .route("/{id}", get(submission::get_submission))
        .route("/{id}/answers", put(submission::upsert_answer))
        .route("/{id}/submit", post(submission::submit_submission))
        .route("/{id}/autograde", post(submission::autograde_submission))
        .route("/{id}/manualgrade", post(submission::manual_grade_submission));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/submissions", submission_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
