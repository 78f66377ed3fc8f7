// src/grading/graders.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::answer::{AnswerKey, StudentAnswers, TrueFalseItems};

use super::{
    normalize::{ScoringSettings, is_match},
    table::SectionKind,
};

/// Why a key entry could not be graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum MalformedReason {
    #[error("no answer key entry")]
    MissingKey,
    #[error("key letter {letter:?} is not one of A, B, C, D")]
    InvalidChoice { letter: char },
    #[error("key is missing sub-item {item}")]
    IncompleteTrueFalse { item: char },
    #[error("key has no acceptable answers")]
    NoAcceptableAnswers,
}

/// A key entry found malformed while grading. The question scores 0 and the
/// rest of the exam is graded normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind} question {question}: {reason}")]
pub struct MalformedEntry {
    pub kind: SectionKind,
    pub question: u32,
    #[serde(flatten)]
    pub reason: MalformedReason,
}

/// Score earned on one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question: u32,
    pub earned: f64,
    /// Number of correct sub-items, true/false only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_items: Option<u8>,
}

/// Unrounded result of grading one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResult {
    pub kind: SectionKind,
    pub points_per_question: f64,
    pub subtotal: f64,
    pub questions: Vec<QuestionScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionGrading {
    pub result: SectionResult,
    pub anomalies: Vec<MalformedEntry>,
}

struct Tally {
    result: SectionResult,
    anomalies: Vec<MalformedEntry>,
}

impl Tally {
    fn new(kind: SectionKind, points_per_question: f64) -> Self {
        Self {
            result: SectionResult {
                kind,
                points_per_question,
                subtotal: 0.0,
                questions: Vec::new(),
            },
            anomalies: Vec::new(),
        }
    }

    fn award(&mut self, question: u32, earned: f64, correct_items: Option<u8>) {
        self.result.subtotal += earned;
        self.result.questions.push(QuestionScore {
            question,
            earned,
            correct_items,
        });
    }

    fn malformed(&mut self, question: u32, reason: MalformedReason) {
        let entry = MalformedEntry {
            kind: self.result.kind,
            question,
            reason,
        };
        self.anomalies.push(entry);
        self.award(question, 0.0, None);
    }

    fn finish(self) -> SectionGrading {
        SectionGrading {
            result: self.result,
            anomalies: self.anomalies,
        }
    }
}

/// Partial credit for a true/false question by number of correct sub-items.
/// Deliberately non-linear.
pub fn true_false_weight(correct_items: u8) -> f64 {
    match correct_items {
        0 => 0.00,
        1 => 0.10,
        2 => 0.25,
        3 => 0.50,
        _ => 1.00,
    }
}

/// Exact letter match. Unanswered or wrong scores 0.
pub fn grade_multiple_choice(
    answers: &BTreeMap<u32, char>,
    key: &BTreeMap<u32, char>,
    count: u32,
    points_per_question: f64,
) -> SectionGrading {
    let mut tally = Tally::new(SectionKind::MultipleChoice, points_per_question);

    for question in 1..=count {
        let Some(&expected) = key.get(&question) else {
            tally.malformed(question, MalformedReason::MissingKey);
            continue;
        };
        if !('A'..='D').contains(&expected) {
            tally.malformed(question, MalformedReason::InvalidChoice { letter: expected });
            continue;
        }
        let earned = match answers.get(&question) {
            Some(&given) if given == expected => points_per_question,
            _ => 0.0,
        };
        tally.award(question, earned, None);
    }

    tally.finish()
}

/// Counts matching sub-items and applies [`true_false_weight`].
pub fn grade_true_false(
    answers: &BTreeMap<u32, TrueFalseItems>,
    key: &BTreeMap<u32, TrueFalseItems>,
    count: u32,
    points_per_question: f64,
) -> SectionGrading {
    let mut tally = Tally::new(SectionKind::TrueFalse, points_per_question);

    for question in 1..=count {
        let Some(expected) = key.get(&question) else {
            tally.malformed(question, MalformedReason::MissingKey);
            continue;
        };
        if let Some(item) = expected.first_missing() {
            tally.malformed(question, MalformedReason::IncompleteTrueFalse { item });
            continue;
        }

        let given = answers.get(&question).copied().unwrap_or_default();
        let correct = expected
            .items()
            .iter()
            .zip(given.items())
            .filter(|(want, got)| got.is_some() && **want == *got)
            .count() as u8;

        tally.award(
            question,
            true_false_weight(correct) * points_per_question,
            Some(correct),
        );
    }

    tally.finish()
}

/// Binary scoring against the acceptable answers after normalization.
pub fn grade_short_answer(
    answers: &BTreeMap<u32, Value>,
    key: &BTreeMap<u32, Vec<String>>,
    count: u32,
    points_per_question: f64,
    settings: &ScoringSettings,
) -> SectionGrading {
    let mut tally = Tally::new(SectionKind::ShortAnswer, points_per_question);

    for question in 1..=count {
        let Some(acceptable) = key.get(&question) else {
            tally.malformed(question, MalformedReason::MissingKey);
            continue;
        };
        if acceptable.is_empty() {
            tally.malformed(question, MalformedReason::NoAcceptableAnswers);
            continue;
        }
        let earned = match answers.get(&question) {
            Some(value) => {
                // Non-string values grade as an empty answer.
                let candidate = value.as_str().unwrap_or_default();
                if is_match(candidate, acceptable, settings) {
                    points_per_question
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        tally.award(question, earned, None);
    }

    tally.finish()
}

/// Grades one section. Sections never look at each other.
pub fn grade_section(
    kind: SectionKind,
    answers: &StudentAnswers,
    key: &AnswerKey,
    count: u32,
    points_per_question: f64,
    settings: &ScoringSettings,
) -> SectionGrading {
    match kind {
        SectionKind::MultipleChoice => grade_multiple_choice(
            &answers.multiple_choice,
            &key.multiple_choice,
            count,
            points_per_question,
        ),
        SectionKind::TrueFalse => {
            grade_true_false(&answers.true_false, &key.true_false, count, points_per_question)
        }
        SectionKind::ShortAnswer => grade_short_answer(
            &answers.short_answer,
            &key.short_answer,
            count,
            points_per_question,
            settings,
        ),
    }
}
