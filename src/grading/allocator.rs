// src/grading/allocator.rs

use serde::{Deserialize, Serialize};

use super::table::{ScoringTable, SectionKind};

/// Number of questions in each section. Zero means the section is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCounts {
    pub multiple_choice: u32,
    pub true_false: u32,
    pub short_answer: u32,
}

impl SectionCounts {
    pub fn new(multiple_choice: u32, true_false: u32, short_answer: u32) -> Self {
        Self {
            multiple_choice,
            true_false,
            short_answer,
        }
    }

    pub fn get(&self, kind: SectionKind) -> u32 {
        match kind {
            SectionKind::MultipleChoice => self.multiple_choice,
            SectionKind::TrueFalse => self.true_false,
            SectionKind::ShortAnswer => self.short_answer,
        }
    }

    pub fn set(&mut self, kind: SectionKind, count: u32) {
        match kind {
            SectionKind::MultipleChoice => self.multiple_choice = count,
            SectionKind::TrueFalse => self.true_false = count,
            SectionKind::ShortAnswer => self.short_answer = count,
        }
    }

    pub fn is_empty(&self) -> bool {
        SectionKind::ALL.iter().all(|kind| self.get(*kind) == 0)
    }
}

/// Per-question point values and the exam's maximum score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointAllocation {
    pub multiple_choice: f64,
    pub true_false: f64,
    pub short_answer: f64,
    pub total: f64,
}

impl PointAllocation {
    pub fn points_per_question(&self, kind: SectionKind) -> f64 {
        match kind {
            SectionKind::MultipleChoice => self.multiple_choice,
            SectionKind::TrueFalse => self.true_false,
            SectionKind::ShortAnswer => self.short_answer,
        }
    }
}

/// Spreads each enabled section's fixed budget evenly over its questions.
///
/// Values are raw `f64` quotients; nothing is rounded here. A disabled
/// section gets 0 points per question and adds nothing to `total`.
pub fn allocate(counts: &SectionCounts, table: &ScoringTable) -> PointAllocation {
    let mut allocation = PointAllocation::default();

    for kind in SectionKind::ALL {
        let count = counts.get(kind);
        if count == 0 {
            continue;
        }
        let budget = table.rule(kind).budget;
        let per_question = budget / f64::from(count);
        match kind {
            SectionKind::MultipleChoice => allocation.multiple_choice = per_question,
            SectionKind::TrueFalse => allocation.true_false = per_question,
            SectionKind::ShortAnswer => allocation.short_answer = per_question,
        }
        allocation.total += budget;
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(mc: u32, tf: u32, sa: u32) -> PointAllocation {
        allocate(&SectionCounts::new(mc, tf, sa), &ScoringTable::STANDARD)
    }

    #[test]
    fn test_all_sections_enabled() {
        let allocation = alloc(12, 4, 6);
        assert_eq!(allocation.multiple_choice, 0.25);
        assert_eq!(allocation.true_false, 1.0);
        assert_eq!(allocation.short_answer, 0.5);
        assert_eq!(allocation.total, 10.0);
    }

    #[test]
    fn test_only_true_false() {
        let allocation = alloc(0, 2, 0);
        assert_eq!(allocation.multiple_choice, 0.0);
        assert_eq!(allocation.true_false, 2.0);
        assert_eq!(allocation.short_answer, 0.0);
        assert_eq!(allocation.total, 4.0);
    }

    #[test]
    fn test_all_disabled_is_zero() {
        let allocation = alloc(0, 0, 0);
        assert_eq!(allocation, PointAllocation::default());
        assert!(allocation.multiple_choice.is_finite());
    }

    #[test]
    fn test_total_depends_only_on_presence() {
        for mc in 0..=12 {
            for tf in 0..=4 {
                for sa in 0..=6 {
                    let expected = 3.0 * f64::from(u8::from(mc > 0))
                        + 4.0 * f64::from(u8::from(tf > 0))
                        + 3.0 * f64::from(u8::from(sa > 0));
                    assert_eq!(alloc(mc, tf, sa).total, expected, "({mc}, {tf}, {sa})");
                }
            }
        }
    }

    #[test]
    fn test_uneven_division_keeps_full_precision() {
        let allocation = alloc(7, 0, 0);
        assert_eq!(allocation.multiple_choice, 3.0 / 7.0);
    }

    #[test]
    fn test_counts_accessors() {
        let mut counts = SectionCounts::default();
        assert!(counts.is_empty());
        counts.set(SectionKind::ShortAnswer, 3);
        assert_eq!(counts.get(SectionKind::ShortAnswer), 3);
        assert!(!counts.is_empty());
    }
}
