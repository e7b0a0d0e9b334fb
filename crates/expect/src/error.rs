//! Error types for confirmations.

use std::fmt;
use std::time::Duration;

use vigil_polling::PollOutcome;

use crate::issue::SourceLocation;

/// Result type returned by confirmations.
pub type ExpectResult<T = ()> = Result<T, ExpectError>;

/// Why a confirmation did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The condition never held before the timer fired.
    NeverPassed,
    /// The timer fired before the first evaluation completed.
    NeverEvaluated,
    /// The condition stopped holding before the timer fired.
    StoppedPassing,
    /// The poll finished but the condition never produced a value.
    NoValueRecorded,
}

impl FailureReason {
    /// Map a failing engine outcome to a reason. `None` for
    /// [`PollOutcome::Finished`] and [`PollOutcome::Cancelled`].
    #[must_use]
    pub const fn from_outcome(outcome: PollOutcome) -> Option<Self> {
        match outcome {
            PollOutcome::TimedOut => Some(Self::NeverPassed),
            PollOutcome::TimedOutWithoutRunning => Some(Self::NeverEvaluated),
            PollOutcome::Failed => Some(Self::StoppedPassing),
            PollOutcome::Finished | PollOutcome::Cancelled => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NeverPassed => "condition never passed",
            Self::NeverEvaluated => "condition was never evaluated",
            Self::StoppedPassing => "condition stopped passing",
            Self::NoValueRecorded => "condition never produced a value",
        })
    }
}

/// Errors returned by a confirmation.
///
/// Both variants have already been handed to the context's reporter when
/// they are returned. Invalid configuration is not an error value: it panics
/// at the call site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpectError {
    /// The condition did not behave as expected.
    #[error("{source_location}: {expression}: {reason} ({evaluations} evaluations in {elapsed:?})")]
    ExpectationFailed {
        /// What was being confirmed.
        expression: String,
        /// Why it failed.
        reason: FailureReason,
        /// Completed evaluations.
        evaluations: u64,
        /// Time spent polling.
        elapsed: Duration,
        /// Where the confirmation was written.
        source_location: SourceLocation,
    },

    /// The surrounding test was cancelled while polling.
    #[error("{source_location}: confirmation cancelled")]
    Cancelled {
        /// Where the confirmation was written.
        source_location: SourceLocation,
    },
}

impl ExpectError {
    /// The condition did not behave as expected.
    #[must_use]
    pub const fn is_expectation_failure(&self) -> bool {
        matches!(self, Self::ExpectationFailed { .. })
    }

    /// Cancellation, reported as a system issue.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The failure reason, for expectation failures.
    #[must_use]
    pub const fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::ExpectationFailed { reason, .. } => Some(*reason),
            Self::Cancelled { .. } => None,
        }
    }

    /// Where the confirmation was written.
    #[must_use]
    pub const fn source_location(&self) -> SourceLocation {
        match self {
            Self::ExpectationFailed {
                source_location, ..
            }
            | Self::Cancelled { source_location } => *source_location,
        }
    }
}
