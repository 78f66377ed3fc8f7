// src/grading/mod.rs

//! Exam scoring engine.
//!
//! Everything here except [`lifecycle`] is a pure function of its inputs.

pub mod aggregate;
pub mod allocator;
pub mod graders;
pub mod lifecycle;
pub mod normalize;
pub mod table;
pub mod validation;

pub use aggregate::{GradingReport, grade_submission, round2};
pub use allocator::{PointAllocation, SectionCounts, allocate};
pub use lifecycle::LifecycleError;
pub use normalize::{ScoringSettings, is_match, normalize};
pub use table::{ScoringTable, SectionKind};
pub use validation::{ValidationError, validate_exam};
