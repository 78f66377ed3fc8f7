// src/models/answer.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grading::table::SectionKind;

/// The four boolean claims (a, b, c, d) of one true/false question.
///
/// Used both for answer keys and for student answers. A sub-item the student
/// left blank is `None` and is graded as incorrect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueFalseItems {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<bool>,
}

impl TrueFalseItems {
    pub const LABELS: [char; 4] = ['a', 'b', 'c', 'd'];

    pub fn new(a: bool, b: bool, c: bool, d: bool) -> Self {
        Self {
            a: Some(a),
            b: Some(b),
            c: Some(c),
            d: Some(d),
        }
    }

    pub fn items(&self) -> [Option<bool>; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// First sub-item without a value, if any.
    pub fn first_missing(&self) -> Option<char> {
        Self::LABELS
            .iter()
            .zip(self.items())
            .find(|(_, value)| value.is_none())
            .map(|(label, _)| *label)
    }
}

/// Correct answers of an exam, keyed by question number inside each section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerKey {
    /// One letter in `A..=D` per question.
    pub multiple_choice: BTreeMap<u32, char>,
    pub true_false: BTreeMap<u32, TrueFalseItems>,
    /// Acceptable strings; the first is canonical, the rest are aliases.
    pub short_answer: BTreeMap<u32, Vec<String>>,
}

impl AnswerKey {
    /// Question numbers that carry a key entry for `kind`.
    pub fn questions(&self, kind: SectionKind) -> Vec<u32> {
        match kind {
            SectionKind::MultipleChoice => self.multiple_choice.keys().copied().collect(),
            SectionKind::TrueFalse => self.true_false.keys().copied().collect(),
            SectionKind::ShortAnswer => self.short_answer.keys().copied().collect(),
        }
    }
}

/// Raw answers of one submission, shaped like [`AnswerKey`].
///
/// Short answers stay as raw JSON so a stored value that is not a string
/// can still be graded (it never matches).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentAnswers {
    pub multiple_choice: BTreeMap<u32, char>,
    pub true_false: BTreeMap<u32, TrueFalseItems>,
    pub short_answer: BTreeMap<u32, Value>,
}

impl StudentAnswers {
    /// Replaces whatever was stored for `question` in the answer's section.
    pub fn upsert(&mut self, question: u32, answer: SectionAnswer) {
        match answer {
            SectionAnswer::MultipleChoice(letter) => {
                self.multiple_choice.insert(question, letter);
            }
            SectionAnswer::TrueFalse(items) => {
                self.true_false.insert(question, items);
            }
            SectionAnswer::ShortAnswer(text) => {
                self.short_answer.insert(question, Value::String(text));
            }
        }
    }
}

/// A single answer, tagged with the section it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "value", rename_all = "camelCase")]
pub enum SectionAnswer {
    MultipleChoice(char),
    TrueFalse(TrueFalseItems),
    ShortAnswer(String),
}

impl SectionAnswer {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionAnswer::MultipleChoice(_) => SectionKind::MultipleChoice,
            SectionAnswer::TrueFalse(_) => SectionKind::TrueFalse,
            SectionAnswer::ShortAnswer(_) => SectionKind::ShortAnswer,
        }
    }

    /// The JSON stored under the question number in [`StudentAnswers`].
    pub fn stored_value(&self) -> Value {
        match self {
            SectionAnswer::MultipleChoice(letter) => Value::String(letter.to_string()),
            SectionAnswer::TrueFalse(items) => {
                serde_json::to_value(items).unwrap_or(Value::Null)
            }
            SectionAnswer::ShortAnswer(text) => Value::String(text.clone()),
        }
    }
}

/// DTO for writing one answer to an open submission.
#[derive(Debug, Deserialize)]
pub struct UpsertAnswerRequest {
    pub question: u32,
    pub answer: SectionAnswer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_true_false_missing_items() {
        let items: TrueFalseItems = serde_json::from_value(json!({"a": true, "c": false})).unwrap();
        assert_eq!(items.items(), [Some(true), None, Some(false), None]);
        assert_eq!(items.first_missing(), Some('b'));
        assert_eq!(TrueFalseItems::new(true, true, false, false).first_missing(), None);
    }

    #[test]
    fn test_section_answer_wire_format() {
        let answer: SectionAnswer =
            serde_json::from_value(json!({"section": "trueFalse", "value": {"a": true, "b": false}}))
                .unwrap();
        assert_eq!(answer.kind(), SectionKind::TrueFalse);

        let answer: SectionAnswer =
            serde_json::from_value(json!({"section": "multipleChoice", "value": "C"})).unwrap();
        assert_eq!(answer, SectionAnswer::MultipleChoice('C'));
        assert_eq!(answer.stored_value(), json!("C"));
    }

    #[test]
    fn test_upsert_replaces_previous_answer() {
        let mut answers = StudentAnswers::default();
        answers.upsert(1, SectionAnswer::ShortAnswer("hue".to_string()));
        answers.upsert(1, SectionAnswer::ShortAnswer("hanoi".to_string()));
        answers.upsert(2, SectionAnswer::MultipleChoice('A'));

        assert_eq!(answers.short_answer.get(&1), Some(&json!("hanoi")));
        assert_eq!(answers.multiple_choice.get(&2), Some(&'A'));
        assert!(answers.true_false.is_empty());
    }

    #[test]
    fn test_answer_maps_use_string_question_keys() {
        let answers: StudentAnswers = serde_json::from_value(json!({
            "multipleChoice": {"1": "B"},
            "shortAnswer": {"2": 17}
        }))
        .unwrap();
        assert_eq!(answers.multiple_choice.get(&1), Some(&'B'));
        assert_eq!(answers.short_answer.get(&2), Some(&json!(17)));
    }
}
