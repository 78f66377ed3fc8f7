// src/handlers/submission.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    grading::{ScoringTable, grade_submission},
    models::{
        answer::UpsertAnswerRequest,
        exam::Exam,
        submission::{
            AutogradeResponse, CreateSubmissionRequest, GradingRecord, ManualGradeRecord,
            ManualGradeRequest, ManualGradeResponse, Submission, SubmissionStatus,
        },
    },
    state::DynStore,
    utils::html::clean_feedback,
};

async fn find_submission(store: &DynStore, id: i64) -> Result<Submission, AppError> {
    store
        .load_submission(id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))
}

async fn find_exam(store: &DynStore, id: i64) -> Result<Exam, AppError> {
    store
        .load_exam_config(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Grades the submission against the exam's current definition and
/// persists the result.
async fn run_autograde(
    store: &DynStore,
    table: &ScoringTable,
    exam: &Exam,
    mut submission: Submission,
) -> Result<AutogradeResponse, AppError> {
    let report = grade_submission(exam.kind, &exam.definition, &submission.answers, table);

    for anomaly in &report.anomalies {
        tracing::warn!(
            "Submission {} (exam {}): malformed key entry scored as 0: {}",
            submission.id,
            exam.id,
            anomaly
        );
    }

    submission.apply_auto_grade(&report, exam.requires_manual_review(), Utc::now())?;
    store
        .persist_grading_result(submission.id, &GradingRecord::from(&submission))
        .await?;

    tracing::info!(
        "Submission {} auto-graded: {}/{} ({})",
        submission.id,
        submission.auto_graded_score,
        submission.max_score,
        submission.status
    );

    Ok(AutogradeResponse {
        auto_graded_score: submission.auto_graded_score,
        max_score: submission.max_score,
        per_section: report.sections,
        anomalies: report.anomalies,
        status: submission.status,
    })
}

/// Starts a submission for a student on a published exam.
pub async fn create_submission(
    State(store): State<DynStore>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exam = find_exam(&store, exam_id).await?;
    if !exam.published {
        return Err(AppError::Conflict("Exam is not published".to_string()));
    }

    let submission = store.insert_submission(exam.id, payload.student_id).await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// Retrieves a single submission by ID.
pub async fn get_submission(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_submission(&store, id).await?))
}

/// Writes (or overwrites) one answer of an open submission.
pub async fn upsert_answer(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
    Json(payload): Json<UpsertAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = find_submission(&store, id).await?;
    if submission.status != SubmissionStatus::Created {
        return Err(AppError::Conflict(format!(
            "Submission is {} and no longer accepts answers",
            submission.status
        )));
    }

    let exam = find_exam(&store, submission.exam_id).await?;
    let kind = payload.answer.kind();
    let count = exam.definition.counts().get(kind);
    if payload.question == 0 || payload.question > count {
        return Err(AppError::BadRequest(format!(
            "Question {} does not exist in the {} section ({} questions)",
            payload.question, kind, count
        )));
    }

    let submission = store
        .upsert_answer(id, payload.question, &payload.answer)
        .await?
        .ok_or(AppError::Conflict(
            "Submission no longer accepts answers".to_string(),
        ))?;

    Ok(Json(submission))
}

/// Submits the answers and auto-grades them immediately.
pub async fn submit_submission(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut submission = find_submission(&store, id).await?;
    let exam = find_exam(&store, submission.exam_id).await?;

    submission.submit(Utc::now())?;

    let response = run_autograde(&store, &table, &exam, submission).await?;
    Ok(Json(response))
}

/// Re-runs auto-grading, e.g. after the answer key was corrected.
pub async fn autograde_submission(
    State(store): State<DynStore>,
    State(table): State<ScoringTable>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = find_submission(&store, id).await?;
    let exam = find_exam(&store, submission.exam_id).await?;

    let response = run_autograde(&store, &table, &exam, submission).await?;
    Ok(Json(response))
}

/// Records a grader's manual score and feedback.
///
/// Allowed while pending review and again after grading (re-grade).
/// Two graders racing on the same submission: the last write wins.
pub async fn manual_grade_submission(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
    Json(payload): Json<ManualGradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut submission = find_submission(&store, id).await?;

    submission.apply_manual_grade(
        payload.manual_graded_score,
        clean_feedback(payload.feedback.as_deref()),
        payload.annotations,
        Utc::now(),
    )?;

    store
        .persist_manual_grade(id, &ManualGradeRecord::from(&submission))
        .await?;

    tracing::info!(
        "Submission {} manually graded: +{} => {}/{}",
        submission.id,
        submission.manual_graded_score,
        submission.total_score,
        submission.max_score
    );

    Ok(Json(ManualGradeResponse {
        total_score: submission.total_score,
        status: submission.status,
    }))
}
