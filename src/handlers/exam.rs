// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    grading::{ScoringTable, aggregate::max_score, validate_exam},
    models::exam::{AllocationResponse, ExamRequest, NewExam},
    state::DynStore,
};

/// Validates a request and computes the exam's max score.
fn prepare_exam(payload: ExamRequest, table: &ScoringTable) -> Result<NewExam, AppError> {
    payload.validate()?;

    let (title, kind, definition) = payload.into_parts();
    validate_exam(kind, &definition, table)?;

    let max_score = max_score(kind, &definition.counts(), table);
    Ok(NewExam {
        title,
        kind,
        definition,
        max_score,
    })
}

/// Creates an unpublished exam.
///
/// * Rejects invalid section counts and answer keys with 400.
/// * Stores the computed max score alongside the definition.
pub async fn create_exam(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Json(payload): Json<ExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_exam = prepare_exam(payload, &table)?;
    let exam = store.insert_exam(new_exam).await?;

    tracing::info!("Exam {} created (max score {})", exam.id, exam.max_score);

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Retrieves a single exam by ID.
pub async fn get_exam(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .load_exam_config(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}

/// Replaces an exam's title, kind and definition.
///
/// Existing submissions are not locked against edits; they pick up the new
/// definition the next time they are auto-graded.
pub async fn update_exam(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Path(id): Path<i64>,
    Json(payload): Json<ExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_exam = prepare_exam(payload, &table)?;
    let exam = store
        .replace_exam(id, new_exam)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    tracing::info!("Exam {} definition replaced", exam.id);

    Ok(Json(exam))
}

/// Publishes an exam after validating it again.
pub async fn publish_exam(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .load_exam_config(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    validate_exam(exam.kind, &exam.definition, &table)?;

    let exam = store
        .publish_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    tracing::info!("Exam {} published", exam.id);

    Ok(Json(exam))
}

/// Per-question point values for each section and the max score.
pub async fn get_allocation(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .load_exam_config(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(AllocationResponse {
        exam_id: exam.id,
        counts: exam.definition.counts(),
        points_per_question: exam.allocation(&table),
        max_score: exam.max_score,
    }))
}
