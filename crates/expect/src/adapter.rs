//! Translates engine reports into caller results and reported issues.
//!
//! | Outcome | Result | Reported |
//! |---|---|---|
//! | `Finished` | `Ok` | nothing |
//! | `TimedOut`, `TimedOutWithoutRunning`, `Failed` | [`ExpectError::ExpectationFailed`] | one failed expectation |
//! | `Cancelled` | [`ExpectError::Cancelled`] | one system issue |

use vigil_polling::{PollOutcome, PollReport};

use crate::error::{ExpectError, ExpectResult, FailureReason};
use crate::issue::{Comment, Expectation, Issue, IssueKind, SourceLocation};
use crate::reporter::IssueReporter;

/// Everything needed to report the outcome of one confirmation.
#[derive(Clone, Copy)]
pub struct OutcomeAdapter<'a> {
    reporter: &'a dyn IssueReporter,
    expression: &'a str,
    required: bool,
    comments: &'a [Comment],
    source_location: SourceLocation,
}

impl<'a> OutcomeAdapter<'a> {
    /// Report through `reporter` on behalf of the confirmation at `source_location`.
    #[must_use]
    pub fn new(
        reporter: &'a dyn IssueReporter,
        expression: &'a str,
        source_location: SourceLocation,
    ) -> Self {
        Self {
            reporter,
            expression,
            required: false,
            comments: &[],
            source_location,
        }
    }

    /// Mark reported expectations as required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach caller comments to every reported issue.
    #[must_use]
    pub fn with_comments(mut self, comments: &'a [Comment]) -> Self {
        self.comments = comments;
        self
    }

    /// Settle a report. Every failure is reported exactly once before the
    /// error is returned.
    pub fn settle(&self, report: PollReport) -> ExpectResult<PollReport> {
        match report.outcome {
            PollOutcome::Finished => Ok(report),
            PollOutcome::Cancelled => Err(self.cancelled()),
            outcome => {
                let reason =
                    FailureReason::from_outcome(outcome).unwrap_or(FailureReason::NeverPassed);
                Err(self.fail(report, reason))
            }
        }
    }

    /// Report a failed expectation and build the matching error.
    pub fn fail(&self, report: PollReport, reason: FailureReason) -> ExpectError {
        tracing::debug!(
            outcome = %report.outcome,
            %reason,
            evaluations = report.evaluations,
            "confirmation failed"
        );
        self.reporter.record(Issue {
            kind: IssueKind::ExpectationFailed(Expectation {
                evaluated_expression: self.expression.to_owned(),
                is_passing: false,
                is_required: self.required,
                source_location: self.source_location,
            }),
            comments: self.comments.to_vec(),
            source_location: self.source_location,
        });

        ExpectError::ExpectationFailed {
            expression: self.expression.to_owned(),
            reason,
            evaluations: report.evaluations,
            elapsed: report.elapsed,
            source_location: self.source_location,
        }
    }

    fn cancelled(&self) -> ExpectError {
        self.reporter.record(Issue {
            kind: IssueKind::System {
                description: format!("{}: cancelled before an outcome was decided", self.expression),
            },
            comments: self.comments.to_vec(),
            source_location: self.source_location,
        });
        ExpectError::Cancelled {
            source_location: self.source_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;
    use rstest::rstest;
    use std::time::Duration;

    fn report(outcome: PollOutcome) -> PollReport {
        PollReport {
            outcome,
            evaluations: 7,
            elapsed: Duration::from_millis(120),
        }
    }

    #[test]
    fn finished_reports_nothing() {
        let reporter = RecordingReporter::new();
        let adapter = OutcomeAdapter::new(&reporter, "cache warmed", SourceLocation::caller());

        let settled = adapter.settle(report(PollOutcome::Finished)).unwrap();
        assert_eq!(settled.evaluations, 7);
        assert!(reporter.is_empty());
    }

    #[rstest]
    #[case(PollOutcome::TimedOut, FailureReason::NeverPassed)]
    #[case(PollOutcome::TimedOutWithoutRunning, FailureReason::NeverEvaluated)]
    #[case(PollOutcome::Failed, FailureReason::StoppedPassing)]
    fn failures_report_one_expectation(#[case] outcome: PollOutcome, #[case] reason: FailureReason) {
        let reporter = RecordingReporter::new();
        let comments = [Comment::from("after restart")];
        let location = SourceLocation::caller();
        let adapter = OutcomeAdapter::new(&reporter, "cache warmed", location)
            .required(true)
            .with_comments(&comments);

        let err = adapter.settle(report(outcome)).unwrap_err();
        assert_eq!(err.reason(), Some(reason));

        let issues = reporter.take();
        assert_eq!(issues.len(), 1);
        let expectation = issues[0].expectation().unwrap();
        assert!(!expectation.is_passing);
        assert!(expectation.is_required);
        assert_eq!(expectation.evaluated_expression, "cache warmed");
        assert_eq!(expectation.source_location, location);
        assert_eq!(issues[0].comments, comments);
    }

    #[test]
    fn cancellation_reports_a_system_issue() {
        let reporter = RecordingReporter::new();
        let adapter = OutcomeAdapter::new(&reporter, "cache warmed", SourceLocation::caller());

        let err = adapter.settle(report(PollOutcome::Cancelled)).unwrap_err();
        assert!(err.is_system());
        assert_eq!(reporter.system_issues(), 1);
        assert_eq!(reporter.expectation_failures(), 0);
    }
}
