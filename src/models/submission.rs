// src/models/submission.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::grading::graders::{MalformedEntry, SectionResult};

use super::answer::StudentAnswers;

/// Grading lifecycle state. Mapped to the Postgres enum `submission_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Created,
    Submitted,
    AutoGraded,
    PendingManualReview,
    Graded,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::Created => "created",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::AutoGraded => "auto_graded",
            SubmissionStatus::PendingManualReview => "pending_manual_review",
            SubmissionStatus::Graded => "graded",
        };
        f.write_str(label)
    }
}

/// Represents the 'submissions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub answers: Json<StudentAnswers>,
    pub auto_graded_score: f64,
    pub manual_graded_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub status: SubmissionStatus,
    pub section_breakdown: Json<Vec<SectionResult>>,
    /// Grader feedback, sanitized before it is stored.
    pub feedback: Option<String>,
    /// Free-form annotation data attached by the grader.
    pub annotations: Option<Json<serde_json::Value>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Bumped by every write to the row.
    #[serde(skip)]
    pub version: i64,
    /// Bumped by writes that change what the auto score is based on:
    /// answers and auto-grading runs. Manual grades leave it alone.
    #[serde(skip)]
    pub auto_version: i64,
}

/// DTO for starting a submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    #[validate(range(min = 1))]
    pub student_id: i64,
}

/// DTO for a grader's manual score.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualGradeRequest {
    pub manual_graded_score: f64,
    #[validate(length(max = 10000))]
    pub feedback: Option<String>,
    pub annotations: Option<serde_json::Value>,
}

/// Fields written once auto-grading has run.
///
/// Only stored if the row is still at `version`; any write in between
/// (an answer, another grading run, a manual grade) makes it stale.
#[derive(Debug, Clone)]
pub struct GradingRecord {
    pub version: i64,
    pub auto_graded_score: f64,
    pub manual_graded_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub section_breakdown: Vec<SectionResult>,
    pub status: SubmissionStatus,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Submission> for GradingRecord {
    fn from(submission: &Submission) -> Self {
        Self {
            version: submission.version,
            auto_graded_score: submission.auto_graded_score,
            manual_graded_score: submission.manual_graded_score,
            total_score: submission.total_score,
            max_score: submission.max_score,
            section_breakdown: submission.section_breakdown.0.clone(),
            status: submission.status,
            submitted_at: submission.submitted_at,
            graded_at: submission.graded_at,
        }
    }
}

/// Fields written by a manual grade.
///
/// Only stored if no answer or auto-grading write happened since
/// `auto_version` was read. Other manual grades do not block it, so racing
/// graders resolve as last write wins.
#[derive(Debug, Clone)]
pub struct ManualGradeRecord {
    pub auto_version: i64,
    pub manual_graded_score: f64,
    pub total_score: f64,
    pub feedback: Option<String>,
    pub annotations: Option<serde_json::Value>,
    pub status: SubmissionStatus,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Submission> for ManualGradeRecord {
    fn from(submission: &Submission) -> Self {
        Self {
            auto_version: submission.auto_version,
            manual_graded_score: submission.manual_graded_score,
            total_score: submission.total_score,
            feedback: submission.feedback.clone(),
            annotations: submission.annotations.as_ref().map(|a| a.0.clone()),
            status: submission.status,
            graded_at: submission.graded_at,
        }
    }
}

/// Response for submit and auto-grade calls.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutogradeResponse {
    pub auto_graded_score: f64,
    pub max_score: f64,
    pub per_section: Vec<SectionResult>,
    pub anomalies: Vec<MalformedEntry>,
    pub status: SubmissionStatus,
}

/// Response for manual grade calls.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualGradeResponse {
    pub total_score: f64,
    pub status: SubmissionStatus,
}
