// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        answer::{SectionAnswer, StudentAnswers},
        exam::{Exam, NewExam},
        submission::{GradingRecord, ManualGradeRecord, Submission, SubmissionStatus},
    },
};

use super::{GradingStore, stale_submission};

#[derive(Default)]
struct Tables {
    exams: HashMap<i64, Exam>,
    submissions: HashMap<i64, Submission>,
    next_exam_id: i64,
    next_submission_id: i64,
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GradingStore for MemoryStore {
    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_exam_id += 1;
        let now = Utc::now();
        let exam = Exam {
            id: tables.next_exam_id,
            title: exam.title,
            kind: exam.kind,
            definition: Json(exam.definition),
            max_score: exam.max_score,
            published: false,
            created_at: now,
            updated_at: now,
        };
        tables.exams.insert(exam.id, exam.clone());
        Ok(exam)
    }

    async fn load_exam_config(&self, exam_id: i64) -> Result<Option<Exam>, AppError> {
        Ok(self.tables.read().await.exams.get(&exam_id).cloned())
    }

    async fn replace_exam(&self, exam_id: i64, exam: NewExam) -> Result<Option<Exam>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.exams.get_mut(&exam_id) else {
            return Ok(None);
        };
        stored.title = exam.title;
        stored.kind = exam.kind;
        stored.definition = Json(exam.definition);
        stored.max_score = exam.max_score;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn publish_exam(&self, exam_id: i64) -> Result<Option<Exam>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.exams.get_mut(&exam_id) else {
            return Ok(None);
        };
        stored.published = true;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn insert_submission(&self, exam_id: i64, student_id: i64) -> Result<Submission, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.exams.contains_key(&exam_id) {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        tables.next_submission_id += 1;
        let submission = Submission {
            id: tables.next_submission_id,
            exam_id,
            student_id,
            answers: Json(StudentAnswers::default()),
            auto_graded_score: 0.0,
            manual_graded_score: 0.0,
            total_score: 0.0,
            max_score: 0.0,
            status: SubmissionStatus::Created,
            section_breakdown: Json(Vec::new()),
            feedback: None,
            annotations: None,
            created_at: Utc::now(),
            submitted_at: None,
            graded_at: None,
            version: 0,
            auto_version: 0,
        };
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn load_submission(&self, submission_id: i64) -> Result<Option<Submission>, AppError> {
        Ok(self.tables.read().await.submissions.get(&submission_id).cloned())
    }

    async fn upsert_answer(
        &self,
        submission_id: i64,
        question: u32,
        answer: &SectionAnswer,
    ) -> Result<Option<Submission>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.submissions.get_mut(&submission_id) {
            Some(stored) if stored.status == SubmissionStatus::Created => {
                stored.answers.0.upsert(question, answer.clone());
                stored.version += 1;
                stored.auto_version += 1;
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn persist_grading_result(
        &self,
        submission_id: i64,
        record: &GradingRecord,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .submissions
            .get_mut(&submission_id)
            .ok_or(AppError::NotFound("Submission not found".to_string()))?;
        if stored.version != record.version {
            return Err(stale_submission());
        }

        stored.auto_graded_score = record.auto_graded_score;
        stored.manual_graded_score = record.manual_graded_score;
        stored.total_score = record.total_score;
        stored.max_score = record.max_score;
        stored.section_breakdown = Json(record.section_breakdown.clone());
        stored.status = record.status;
        stored.submitted_at = record.submitted_at;
        stored.graded_at = record.graded_at;
        stored.version += 1;
        stored.auto_version += 1;
        Ok(())
    }

    async fn persist_manual_grade(
        &self,
        submission_id: i64,
        record: &ManualGradeRecord,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .submissions
            .get_mut(&submission_id)
            .ok_or(AppError::NotFound("Submission not found".to_string()))?;
        if stored.auto_version != record.auto_version {
            return Err(stale_submission());
        }

        stored.manual_graded_score = record.manual_graded_score;
        stored.total_score = record.total_score;
        stored.feedback = record.feedback.clone();
        stored.annotations = record.annotations.clone().map(Json);
        stored.status = record.status;
        stored.graded_at = record.graded_at;
        stored.version += 1;
        Ok(())
    }
}
