// src/grading/normalize.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern, cannot fail to compile.
    Regex::new(r"\s+").unwrap()
});

/// Text-matching options for short answers.
///
/// Every field has an explicit default, so a stored exam without settings
/// behaves the same as one that spells out:
/// `{"caseSensitive": false, "trimWhitespace": true, "normalizeSpaces": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringSettings {
    pub case_sensitive: bool,
    pub trim_whitespace: bool,
    pub normalize_spaces: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            trim_whitespace: true,
            normalize_spaces: true,
        }
    }
}

/// Canonical form of a short answer.
///
/// Steps run in a fixed order: trim, collapse whitespace runs, lower-case.
/// The result is stable under a second application.
pub fn normalize(text: &str, settings: &ScoringSettings) -> String {
    let mut out = if settings.trim_whitespace {
        text.trim().to_string()
    } else {
        text.to_string()
    };

    if settings.normalize_spaces {
        out = WHITESPACE_RUN.replace_all(&out, " ").into_owned();
    }

    if !settings.case_sensitive {
        out = out.to_lowercase();
    }

    out
}

/// True when `candidate` equals at least one acceptable answer after both
/// sides are normalized. An empty list never matches.
pub fn is_match(candidate: &str, acceptable: &[String], settings: &ScoringSettings) -> bool {
    if acceptable.is_empty() {
        return false;
    }
    let canonical = normalize(candidate, settings);
    acceptable
        .iter()
        .any(|answer| normalize(answer, settings) == canonical)
}
