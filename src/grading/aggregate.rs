// src/grading/aggregate.rs

use crate::models::{
    answer::StudentAnswers,
    exam::{ExamDefinition, ExamKind},
};

use super::{
    allocator::{PointAllocation, SectionCounts, allocate},
    graders::{MalformedEntry, SectionResult, grade_section},
    table::{ScoringTable, SectionKind},
};

/// Rounds to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sums section subtotals and rounds once, after the sum.
pub fn aggregate<I>(subtotals: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    round2(subtotals.into_iter().sum())
}

/// Maximum score of an exam.
///
/// Objective exams score out of the allocator total. File-upload exams have
/// no objective section and are graded by hand on the full scale.
pub fn max_score(kind: ExamKind, counts: &SectionCounts, table: &ScoringTable) -> f64 {
    match kind {
        ExamKind::FileUpload => table.full_scale(),
        _ => allocate(counts, table).total,
    }
}

/// Outcome of auto-grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingReport {
    pub auto_graded_score: f64,
    pub max_score: f64,
    pub allocation: PointAllocation,
    pub sections: Vec<SectionResult>,
    pub anomalies: Vec<MalformedEntry>,
}

/// Grades every enabled section of `definition` against `answers`.
///
/// Pure: reads only its arguments, so submissions can be graded
/// concurrently without coordination.
pub fn grade_submission(
    kind: ExamKind,
    definition: &ExamDefinition,
    answers: &StudentAnswers,
    table: &ScoringTable,
) -> GradingReport {
    let counts = definition.counts();
    let allocation = allocate(&counts, table);

    let mut sections = Vec::new();
    let mut anomalies = Vec::new();

    for section in SectionKind::ALL {
        let count = counts.get(section);
        if count == 0 {
            continue;
        }
        let graded = grade_section(
            section,
            answers,
            &definition.answer_key,
            count,
            allocation.points_per_question(section),
            &definition.settings,
        );
        sections.push(graded.result);
        anomalies.extend(graded.anomalies);
    }

    GradingReport {
        auto_graded_score: aggregate(sections.iter().map(|s| s.subtotal)),
        max_score: max_score(kind, &counts, table),
        allocation,
        sections,
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        answer::{AnswerKey, SectionAnswer, TrueFalseItems},
        exam::SectionConfig,
    };

    fn full_exam() -> ExamDefinition {
        let mut key = AnswerKey::default();
        for q in 1..=12 {
            key.multiple_choice.insert(q, 'A');
        }
        for q in 1..=4 {
            key.true_false
                .insert(q, TrueFalseItems::new(true, false, true, false));
        }
        for q in 1..=6 {
            key.short_answer.insert(q, vec![format!("answer {q}")]);
        }
        ExamDefinition {
            sections: vec![
                SectionConfig {
                    kind: SectionKind::MultipleChoice,
                    count: 12,
                },
                SectionConfig {
                    kind: SectionKind::TrueFalse,
                    count: 4,
                },
                SectionConfig {
                    kind: SectionKind::ShortAnswer,
                    count: 6,
                },
            ],
            answer_key: key,
            ..Default::default()
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.333), 3.33);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(6.5), 6.5);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_rounding_happens_once_after_sum() {
        assert_eq!(aggregate([1.111, 1.111, 1.111]), 3.33);
        // Rounding each subtotal first would give 0.0.
        assert_eq!(aggregate([0.004, 0.004, 0.004]), 0.01);
    }

    #[test]
    fn test_perfect_submission_scores_max() {
        let exam = full_exam();
        let mut answers = StudentAnswers::default();
        for q in 1..=12 {
            answers.upsert(q, SectionAnswer::MultipleChoice('A'));
        }
        for q in 1..=4 {
            answers.upsert(q, SectionAnswer::TrueFalse(TrueFalseItems::new(true, false, true, false)));
        }
        for q in 1..=6 {
            answers.upsert(q, SectionAnswer::ShortAnswer(format!("ANSWER {q}")));
        }

        let report = grade_submission(
            ExamKind::MixedSections,
            &exam,
            &answers,
            &ScoringTable::STANDARD,
        );
        assert_eq!(report.auto_graded_score, 10.0);
        assert_eq!(report.max_score, 10.0);
        assert_eq!(report.sections.len(), 3);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_partial_submission() {
        let exam = full_exam();
        let mut answers = StudentAnswers::default();
        // 5 of 12 multiple choice: 1.25
        for q in 1..=5 {
            answers.upsert(q, SectionAnswer::MultipleChoice('A'));
        }
        // 3 of 4 sub-items on question 1: 0.5
        answers.upsert(1, SectionAnswer::TrueFalse(TrueFalseItems::new(true, false, true, true)));
        // 1 of 6 short answers: 0.5
        answers.upsert(2, SectionAnswer::ShortAnswer("answer 2".to_string()));

        let report = grade_submission(
            ExamKind::InteractiveQuestionSet,
            &exam,
            &answers,
            &ScoringTable::STANDARD,
        );
        assert_eq!(report.auto_graded_score, 2.25);
        assert_eq!(report.allocation.multiple_choice, 0.25);
    }

    #[test]
    fn test_disabled_sections_are_skipped() {
        let mut exam = full_exam();
        exam.sections.retain(|s| s.kind == SectionKind::TrueFalse);
        exam.sections[0].count = 2;

        let report = grade_submission(
            ExamKind::MixedSections,
            &exam,
            &StudentAnswers::default(),
            &ScoringTable::STANDARD,
        );
        assert_eq!(report.max_score, 4.0);
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].points_per_question, 2.0);
        assert_eq!(report.auto_graded_score, 0.0);
    }

    #[test]
    fn test_file_upload_uses_full_scale() {
        let report = grade_submission(
            ExamKind::FileUpload,
            &ExamDefinition::default(),
            &StudentAnswers::default(),
            &ScoringTable::STANDARD,
        );
        assert_eq!(report.auto_graded_score, 0.0);
        assert_eq!(report.max_score, 10.0);
        assert!(report.sections.is_empty());
    }
}
