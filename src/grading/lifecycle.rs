// src/grading/lifecycle.rs

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use thiserror::Error;

use crate::models::submission::{Submission, SubmissionStatus};

use super::aggregate::{GradingReport, round2};

/// Slack for comparing a manual score with the remaining headroom, which is
/// itself the difference of two rounded floats.
const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error("cannot {action} a submission in state {from}")]
    InvalidTransition {
        from: SubmissionStatus,
        action: &'static str,
    },

    #[error("manual score {score} must be between 0 and {headroom}")]
    ManualScoreOutOfRange { score: f64, headroom: f64 },
}

impl Submission {
    /// Points still available for a manual grade.
    pub fn headroom(&self) -> f64 {
        round2((self.max_score - self.auto_graded_score).max(0.0))
    }

    /// `Created` -> `Submitted`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        if self.status != SubmissionStatus::Created {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                action: "submit",
            });
        }
        self.status = SubmissionStatus::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// Stores an auto-grading report and moves the submission forward.
    ///
    /// Without human review the submission is finalized immediately and any
    /// earlier manual score is dropped. With review it waits in `PendingManualReview`, unless it was already
    /// `Graded`, in which case the existing manual score is kept and clamped
    /// to the new headroom. Re-running is allowed from any state after
    /// `Created`.
    pub fn apply_auto_grade(
        &mut self,
        report: &GradingReport,
        requires_review: bool,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if self.status == SubmissionStatus::Created {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                action: "auto-grade",
            });
        }

        let was_graded = self.status == SubmissionStatus::Graded;

        self.auto_graded_score = report.auto_graded_score;
        self.max_score = report.max_score;
        self.section_breakdown = Json(report.sections.clone());
        // Transient: always resolved to Graded or PendingManualReview below.
        self.status = SubmissionStatus::AutoGraded;

        let headroom = self.headroom();
        if !requires_review {
            self.manual_graded_score = 0.0;
        } else if self.manual_graded_score > headroom {
            tracing::warn!(
                "Submission {} manual score {} exceeds new headroom {}, clamping",
                self.id,
                self.manual_graded_score,
                headroom
            );
            self.manual_graded_score = headroom;
        }
        self.total_score = self.auto_graded_score + self.manual_graded_score;

        if !requires_review || was_graded {
            self.status = SubmissionStatus::Graded;
            self.graded_at = Some(now);
        } else {
            self.status = SubmissionStatus::PendingManualReview;
        }

        Ok(())
    }

    /// Attaches a grader's score and feedback, finalizing the submission.
    ///
    /// Calling it again on a `Graded` submission re-grades it: score,
    /// feedback and annotations are overwritten and `graded_at` moves.
    /// Concurrent calls on one submission resolve as last write wins.
    pub fn apply_manual_grade(
        &mut self,
        score: f64,
        feedback: Option<String>,
        annotations: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        match self.status {
            SubmissionStatus::PendingManualReview | SubmissionStatus::Graded => {}
            from => {
                return Err(LifecycleError::InvalidTransition {
                    from,
                    action: "manually grade",
                });
            }
        }

        let headroom = self.headroom();
        if !score.is_finite() || score < 0.0 || score > headroom + SCORE_EPSILON {
            return Err(LifecycleError::ManualScoreOutOfRange { score, headroom });
        }

        // Both parts carry two decimals; the total is their plain sum.
        self.manual_graded_score = round2(score.min(headroom));
        self.total_score = self.auto_graded_score + self.manual_graded_score;
        self.feedback = feedback;
        self.annotations = annotations.map(Json);
        self.status = SubmissionStatus::Graded;
        self.graded_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grading::{
            allocator::PointAllocation,
            graders::SectionResult,
            table::SectionKind,
        },
        models::answer::StudentAnswers,
    };

    fn submission() -> Submission {
        Submission {
            id: 1,
            exam_id: 1,
            student_id: 7,
            answers: Json(StudentAnswers::default()),
            auto_graded_score: 0.0,
            manual_graded_score: 0.0,
            total_score: 0.0,
            max_score: 0.0,
            status: SubmissionStatus::Created,
            section_breakdown: Json(Vec::new()),
            feedback: None,
            annotations: None,
            created_at: Utc::now(),
            submitted_at: None,
            graded_at: None,
            version: 0,
            auto_version: 0,
        }
    }

    fn report(auto: f64, max: f64) -> GradingReport {
        GradingReport {
            auto_graded_score: auto,
            max_score: max,
            allocation: PointAllocation::default(),
            sections: vec![SectionResult {
                kind: SectionKind::MultipleChoice,
                points_per_question: 0.25,
                subtotal: auto,
                questions: Vec::new(),
            }],
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn test_objective_exam_finalizes_on_auto_grade() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(7.25, 10.0), false, Utc::now()).unwrap();

        assert_eq!(sub.status, SubmissionStatus::Graded);
        assert_eq!(sub.manual_graded_score, 0.0);
        assert_eq!(sub.total_score, 7.25);
        assert!(sub.graded_at.is_some());
        assert_eq!(sub.section_breakdown.0.len(), 1);
    }

    #[test]
    fn test_review_exam_waits_then_regrades_last_write_wins() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(6.5, 10.0), true, Utc::now()).unwrap();
        assert_eq!(sub.status, SubmissionStatus::PendingManualReview);
        assert!(sub.graded_at.is_none());

        sub.apply_manual_grade(3.0, Some("Good work".to_string()), None, Utc::now())
            .unwrap();
        assert_eq!(sub.status, SubmissionStatus::Graded);
        assert_eq!(sub.total_score, 9.5);
        let first_graded_at = sub.graded_at;

        sub.apply_manual_grade(3.5, None, None, Utc::now()).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Graded);
        assert_eq!(sub.total_score, 10.0);
        assert_eq!(sub.feedback, None);
        assert!(sub.graded_at >= first_graded_at);
    }

    #[test]
    fn test_manual_score_bounds() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(6.5, 10.0), true, Utc::now()).unwrap();

        for bad in [-0.5, 3.51, f64::NAN, f64::INFINITY] {
            let err = sub.apply_manual_grade(bad, None, None, Utc::now()).unwrap_err();
            assert!(matches!(err, LifecycleError::ManualScoreOutOfRange { .. }));
        }
        assert_eq!(sub.status, SubmissionStatus::PendingManualReview);
    }

    #[test]
    fn test_headroom_after_rounded_auto_score() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(3.33, 10.0), true, Utc::now()).unwrap();
        sub.apply_manual_grade(6.67, None, None, Utc::now()).unwrap();
        assert_eq!(sub.total_score, 10.0);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sub = submission();
        assert!(matches!(
            sub.apply_auto_grade(&report(1.0, 10.0), false, Utc::now()),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        assert!(matches!(
            sub.apply_manual_grade(1.0, None, None, Utc::now()),
            Err(LifecycleError::InvalidTransition { .. })
        ));

        sub.submit(Utc::now()).unwrap();
        assert!(matches!(
            sub.submit(Utc::now()),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        assert!(matches!(
            sub.apply_manual_grade(1.0, None, None, Utc::now()),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_fractional_manual_score_keeps_total_consistent() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(6.5, 10.0), true, Utc::now()).unwrap();
        sub.apply_manual_grade(3.333, None, None, Utc::now()).unwrap();

        assert_eq!(sub.manual_graded_score, 3.33);
        assert_eq!(sub.total_score, sub.auto_graded_score + sub.manual_graded_score);
        assert!((sub.total_score - 9.83).abs() < 1e-9);
    }

    #[test]
    fn test_objective_regrade_drops_manual_score() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(5.0, 10.0), true, Utc::now()).unwrap();
        sub.apply_manual_grade(2.0, None, None, Utc::now()).unwrap();
        assert_eq!(sub.total_score, 7.0);

        // The exam no longer asks for review
        sub.apply_auto_grade(&report(5.5, 10.0), false, Utc::now()).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Graded);
        assert_eq!(sub.manual_graded_score, 0.0);
        assert_eq!(sub.total_score, 5.5);
    }

    #[test]
    fn test_regrade_clamps_manual_score() {
        let mut sub = submission();
        sub.submit(Utc::now()).unwrap();
        sub.apply_auto_grade(&report(6.0, 10.0), true, Utc::now()).unwrap();
        sub.apply_manual_grade(4.0, None, None, Utc::now()).unwrap();

        sub.apply_auto_grade(&report(8.0, 10.0), true, Utc::now()).unwrap();
        assert_eq!(sub.status, SubmissionStatus::Graded);
        assert_eq!(sub.manual_graded_score, 2.0);
        assert_eq!(sub.total_score, 10.0);
    }
}
