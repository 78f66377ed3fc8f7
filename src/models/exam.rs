// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::grading::{
    allocator::{PointAllocation, SectionCounts, allocate},
    normalize::ScoringSettings,
    table::{ScoringTable, SectionKind},
};

use super::answer::AnswerKey;

/// How an exam is delivered. Mapped to the Postgres enum `exam_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "exam_kind", rename_all = "snake_case")]
pub enum ExamKind {
    InteractiveQuestionSet,
    FileUpload,
    SingleChoiceSheet,
    MixedSections,
}

/// One enabled (or disabled, when `count == 0`) section of an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub kind: SectionKind,
    pub count: u32,
}

/// Everything the grading engine needs to know about an exam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDefinition {
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub answer_key: AnswerKey,
    #[serde(default)]
    pub settings: ScoringSettings,
    /// Forces a human review step even when every section is objective.
    #[serde(default)]
    pub requires_manual_review: bool,
}

impl ExamDefinition {
    /// Question counts per section. Sections not listed count as disabled.
    pub fn counts(&self) -> SectionCounts {
        let mut counts = SectionCounts::default();
        for section in &self.sections {
            counts.set(section.kind, section.count);
        }
        counts
    }
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub kind: ExamKind,
    pub definition: Json<ExamDefinition>,
    pub max_score: f64,
    pub published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Exam {
    /// File-upload exams always go through a grader; other kinds only when
    /// the definition asks for it.
    pub fn requires_manual_review(&self) -> bool {
        self.kind == ExamKind::FileUpload || self.definition.requires_manual_review
    }

    pub fn allocation(&self, table: &ScoringTable) -> PointAllocation {
        allocate(&self.definition.counts(), table)
    }
}

/// DTO for creating an exam or replacing its definition.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExamRequest {
    #[validate(length(min = 1, max = 200, message = "Title length must be between 1 and 200 characters."))]
    pub title: String,
    pub kind: ExamKind,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub answer_key: AnswerKey,
    #[serde(default)]
    pub settings: ScoringSettings,
    #[serde(default)]
    pub requires_manual_review: bool,
}

impl ExamRequest {
    /// Splits the request into its title, kind and grading definition.
    pub fn into_parts(self) -> (String, ExamKind, ExamDefinition) {
        let definition = ExamDefinition {
            sections: self.sections,
            answer_key: self.answer_key,
            settings: self.settings,
            requires_manual_review: self.requires_manual_review,
        };
        (self.title, self.kind, definition)
    }
}

/// Validated exam ready to be stored.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub title: String,
    pub kind: ExamKind,
    pub definition: ExamDefinition,
    pub max_score: f64,
}

/// Response DTO for the allocation view of an exam.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub exam_id: i64,
    pub counts: SectionCounts,
    pub points_per_question: PointAllocation,
    pub max_score: f64,
}
