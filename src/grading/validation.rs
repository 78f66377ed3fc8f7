// src/grading/validation.rs

use std::collections::HashSet;

use thiserror::Error;

use crate::models::exam::{ExamDefinition, ExamKind};

use super::{
    normalize::normalize,
    table::{ScoringTable, SectionKind},
};

/// Reasons an exam configuration is rejected at create/publish time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} section has {count} questions, maximum is {max}")]
    CountExceedsMaximum { kind: SectionKind, count: u32, max: u32 },

    #[error("{kind} section is listed more than once")]
    DuplicateSection { kind: SectionKind },

    #[error("{kind} section is not allowed in a {exam_kind} exam")]
    SectionNotAllowed { kind: SectionKind, exam_kind: &'static str },

    #[error("exam has no questions")]
    NoQuestions,

    #[error("{kind} question {question} has no answer key")]
    MissingKey { kind: SectionKind, question: u32 },

    #[error("{kind} answer key references question {question}, section has {count}")]
    QuestionOutOfRange { kind: SectionKind, question: u32, count: u32 },

    #[error("multiple-choice question {question} has key {letter:?}, expected one of A, B, C, D")]
    InvalidChoice { question: u32, letter: char },

    #[error("true/false question {question} is missing sub-item {item}")]
    IncompleteTrueFalse { question: u32, item: char },

    #[error("short-answer question {question} has no acceptable answers")]
    EmptyAcceptableAnswers { question: u32 },

    #[error("short-answer question {question} has a blank acceptable answer")]
    BlankAcceptableAnswer { question: u32 },
}

fn kind_label(kind: ExamKind) -> &'static str {
    match kind {
        ExamKind::InteractiveQuestionSet => "interactive question set",
        ExamKind::FileUpload => "file upload",
        ExamKind::SingleChoiceSheet => "single choice sheet",
        ExamKind::MixedSections => "mixed sections",
    }
}

fn section_allowed(exam_kind: ExamKind, section: SectionKind) -> bool {
    match exam_kind {
        ExamKind::FileUpload => false,
        ExamKind::SingleChoiceSheet => section == SectionKind::MultipleChoice,
        ExamKind::InteractiveQuestionSet | ExamKind::MixedSections => true,
    }
}

/// Checks an exam definition before it is stored or published.
///
/// Fails on the first problem found. Grading code assumes every exam that
/// passed this check is well formed.
pub fn validate_exam(
    exam_kind: ExamKind,
    definition: &ExamDefinition,
    table: &ScoringTable,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for section in &definition.sections {
        if !seen.insert(section.kind) {
            return Err(ValidationError::DuplicateSection { kind: section.kind });
        }
        let max = table.rule(section.kind).max_count;
        if section.count > max {
            return Err(ValidationError::CountExceedsMaximum {
                kind: section.kind,
                count: section.count,
                max,
            });
        }
        if section.count > 0 && !section_allowed(exam_kind, section.kind) {
            return Err(ValidationError::SectionNotAllowed {
                kind: section.kind,
                exam_kind: kind_label(exam_kind),
            });
        }
    }

    let counts = definition.counts();
    if counts.is_empty() && exam_kind != ExamKind::FileUpload {
        return Err(ValidationError::NoQuestions);
    }

    let key = &definition.answer_key;
    for kind in SectionKind::ALL {
        let count = counts.get(kind);
        if let Some(&question) = key.questions(kind).iter().find(|q| **q == 0 || **q > count) {
            return Err(ValidationError::QuestionOutOfRange {
                kind,
                question,
                count,
            });
        }

        for question in 1..=count {
            match kind {
                SectionKind::MultipleChoice => {
                    let letter = *key
                        .multiple_choice
                        .get(&question)
                        .ok_or(ValidationError::MissingKey { kind, question })?;
                    if !('A'..='D').contains(&letter) {
                        return Err(ValidationError::InvalidChoice { question, letter });
                    }
                }
                SectionKind::TrueFalse => {
                    let items = key
                        .true_false
                        .get(&question)
                        .ok_or(ValidationError::MissingKey { kind, question })?;
                    if let Some(item) = items.first_missing() {
                        return Err(ValidationError::IncompleteTrueFalse { question, item });
                    }
                }
                SectionKind::ShortAnswer => {
                    let acceptable = key
                        .short_answer
                        .get(&question)
                        .ok_or(ValidationError::MissingKey { kind, question })?;
                    if acceptable.is_empty() {
                        return Err(ValidationError::EmptyAcceptableAnswers { question });
                    }
                    if acceptable
                        .iter()
                        .any(|answer| normalize(answer, &definition.settings).is_empty())
                    {
                        return Err(ValidationError::BlankAcceptableAnswer { question });
                    }
                }
            }
        }
    }

    Ok(())
}
