// src/store/mod.rs

//! Storage collaborator of the grading engine.
//!
//! The engine never touches storage directly; handlers load an exam and a
//! submission through [`GradingStore`], run the pure grading functions and
//! persist the outcome. Cross-submission ordering is the store's concern.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        answer::SectionAnswer,
        exam::{Exam, NewExam},
        submission::{GradingRecord, ManualGradeRecord, Submission},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A conditional write found the submission changed since it was loaded.
pub(crate) fn stale_submission() -> AppError {
    AppError::Conflict("Submission was modified concurrently, reload and retry".to_string())
}

#[async_trait]
pub trait GradingStore: Send + Sync {
    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError>;

    /// Sections, answer key and settings of an exam. Read-only for grading.
    async fn load_exam_config(&self, exam_id: i64) -> Result<Option<Exam>, AppError>;

    /// Replaces title, kind, definition and max score. Returns `None` when
    /// the exam does not exist.
    async fn replace_exam(&self, exam_id: i64, exam: NewExam) -> Result<Option<Exam>, AppError>;

    async fn publish_exam(&self, exam_id: i64) -> Result<Option<Exam>, AppError>;

    async fn insert_submission(&self, exam_id: i64, student_id: i64) -> Result<Submission, AppError>;

    async fn load_submission(&self, submission_id: i64) -> Result<Option<Submission>, AppError>;

    /// Writes one answer while the submission is still `Created`.
    /// Returns `None` when no open submission matched.
    async fn upsert_answer(
        &self,
        submission_id: i64,
        question: u32,
        answer: &SectionAnswer,
    ) -> Result<Option<Submission>, AppError>;

    /// Called once per auto-grading run. Fails with `Conflict` when the row
    /// moved past `record.version`.
    async fn persist_grading_result(
        &self,
        submission_id: i64,
        record: &GradingRecord,
    ) -> Result<(), AppError>;

    /// Called by the human-grading workflow, any number of times. Fails with
    /// `Conflict` when answers or the auto score moved past
    /// `record.auto_version`.
    async fn persist_manual_grade(
        &self,
        submission_id: i64,
        record: &ManualGradeRecord,
    ) -> Result<(), AppError>;
}
