// src/grading/table.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three question-type groups a mixed exam can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl SectionKind {
    /// Fixed grading and aggregation order.
    pub const ALL: [SectionKind; 3] = [
        SectionKind::MultipleChoice,
        SectionKind::TrueFalse,
        SectionKind::ShortAnswer,
    ];

    /// Key used for this section inside stored answer maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::MultipleChoice => "multipleChoice",
            SectionKind::TrueFalse => "trueFalse",
            SectionKind::ShortAnswer => "shortAnswer",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SectionKind::MultipleChoice => "multiple-choice",
            SectionKind::TrueFalse => "true/false",
            SectionKind::ShortAnswer => "short-answer",
        };
        f.write_str(label)
    }
}

/// Point budget and question cap for one section kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRule {
    pub budget: f64,
    pub max_count: u32,
}

/// Static scoring constants.
///
/// The budgets do not depend on how many questions a section holds, only on
/// whether the section is present. `STANDARD` is the 3 : 4 : 3 product rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringTable {
    pub multiple_choice: SectionRule,
    pub true_false: SectionRule,
    pub short_answer: SectionRule,
}

impl ScoringTable {
    pub const STANDARD: ScoringTable = ScoringTable {
        multiple_choice: SectionRule {
            budget: 3.0,
            max_count: 12,
        },
        true_false: SectionRule {
            budget: 4.0,
            max_count: 4,
        },
        short_answer: SectionRule {
            budget: 3.0,
            max_count: 6,
        },
    };

    pub fn rule(&self, kind: SectionKind) -> SectionRule {
        match kind {
            SectionKind::MultipleChoice => self.multiple_choice,
            SectionKind::TrueFalse => self.true_false,
            SectionKind::ShortAnswer => self.short_answer,
        }
    }

    /// Sum of every section budget, i.e. the score of an exam with all
    /// sections enabled.
    pub fn full_scale(&self) -> f64 {
        SectionKind::ALL
            .iter()
            .map(|kind| self.rule(*kind).budget)
            .sum()
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self::STANDARD
    }
}
