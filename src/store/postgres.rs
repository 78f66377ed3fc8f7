// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        answer::SectionAnswer,
        exam::{Exam, NewExam},
        submission::{GradingRecord, ManualGradeRecord, Submission},
    },
};

use super::{GradingStore, stale_submission};

const EXAM_COLUMNS: &str = "\
    id, title, kind, definition, max_score, published, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "\
    id, exam_id, student_id, answers, auto_graded_score, manual_graded_score, \
    total_score, max_score, status, section_breakdown, feedback, annotations, \
    created_at, submitted_at, graded_at, version, auto_version";

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tells apart the two reasons a guarded update matched no row.
    async fn missing_or_stale(&self, submission_id: i64) -> Result<AppError, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM submissions WHERE id = $1)")
                .bind(submission_id)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Ok(stale_submission())
        } else {
            Ok(AppError::NotFound("Submission not found".to_string()))
        }
    }
}

#[async_trait]
impl GradingStore for PgStore {
    async fn insert_exam(&self, exam: NewExam) -> Result<Exam, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "INSERT INTO exams (title, kind, definition, max_score)
             VALUES ($1, $2, $3, $4)
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(&exam.title)
        .bind(exam.kind)
        .bind(Json(&exam.definition))
        .bind(exam.max_score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(exam)
    }

    async fn load_exam_config(&self, exam_id: i64) -> Result<Option<Exam>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"
        ))
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    async fn replace_exam(&self, exam_id: i64, exam: NewExam) -> Result<Option<Exam>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "UPDATE exams
             SET title = $1, kind = $2, definition = $3, max_score = $4, updated_at = NOW()
             WHERE id = $5
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(&exam.title)
        .bind(exam.kind)
        .bind(Json(&exam.definition))
        .bind(exam.max_score)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update exam {}: {:?}", exam_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(exam)
    }

    async fn publish_exam(&self, exam_id: i64) -> Result<Option<Exam>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "UPDATE exams SET published = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    async fn insert_submission(&self, exam_id: i64, student_id: i64) -> Result<Submission, AppError> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "INSERT INTO submissions (exam_id, student_id)
             VALUES ($1, $2)
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(exam_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(submission)
    }

    async fn load_submission(&self, submission_id: i64) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn upsert_answer(
        &self,
        submission_id: i64,
        question: u32,
        answer: &SectionAnswer,
    ) -> Result<Option<Submission>, AppError> {
        let section = answer.kind().as_str();

        // One statement per answer, so concurrent writes to different
        // questions never overwrite each other.
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions
             SET answers = jsonb_set(
                 jsonb_set(answers, ARRAY[$1::TEXT], COALESCE(answers -> $1::TEXT, '{{}}'::JSONB)),
                 ARRAY[$1::TEXT, $2::TEXT],
                 $3::JSONB
             ),
             version = version + 1,
             auto_version = auto_version + 1
             WHERE id = $4 AND status = 'created'
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(section)
        .bind(question.to_string())
        .bind(answer.stored_value())
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert answer on submission {}: {:?}", submission_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(submission)
    }

    async fn persist_grading_result(
        &self,
        submission_id: i64,
        record: &GradingRecord,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE submissions
             SET auto_graded_score = $1,
                 manual_graded_score = $2,
                 total_score = $3,
                 max_score = $4,
                 section_breakdown = $5,
                 status = $6,
                 submitted_at = $7,
                 graded_at = $8,
                 version = version + 1,
                 auto_version = auto_version + 1
             WHERE id = $9 AND version = $10",
        )
        .bind(record.auto_graded_score)
        .bind(record.manual_graded_score)
        .bind(record.total_score)
        .bind(record.max_score)
        .bind(Json(&record.section_breakdown))
        .bind(record.status)
        .bind(record.submitted_at)
        .bind(record.graded_at)
        .bind(submission_id)
        .bind(record.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist grading result for {}: {:?}", submission_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(submission_id).await?);
        }

        Ok(())
    }

    async fn persist_manual_grade(
        &self,
        submission_id: i64,
        record: &ManualGradeRecord,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE submissions
             SET manual_graded_score = $1,
                 total_score = $2,
                 feedback = $3,
                 annotations = $4,
                 status = $5,
                 graded_at = $6,
                 version = version + 1
             WHERE id = $7 AND auto_version = $8",
        )
        .bind(record.manual_graded_score)
        .bind(record.total_score)
        .bind(&record.feedback)
        .bind(record.annotations.as_ref().map(Json))
        .bind(record.status)
        .bind(record.graded_at)
        .bind(submission_id)
        .bind(record.auto_version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist manual grade for {}: {:?}", submission_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(submission_id).await?);
        }

        Ok(())
    }
}
