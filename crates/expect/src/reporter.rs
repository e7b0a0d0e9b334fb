//! Reporting sinks for issues.
//!
//! The confirmation surface hands every failure to an [`IssueReporter`]
//! exactly once. Two sinks ship with the crate:
//!
//! - [`TracingReporter`] -- logs issues through `tracing` (the default)
//! - [`RecordingReporter`] -- keeps issues in memory for later inspection

use std::fmt;

use parking_lot::Mutex;

use crate::issue::{Issue, IssueKind};

/// Receives issues recorded by confirmations.
pub trait IssueReporter: Send + Sync {
    /// Record one issue.
    fn record(&self, issue: Issue);
}

/// Logs issues: expectation failures at `error`, system issues at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl IssueReporter for TracingReporter {
    fn record(&self, issue: Issue) {
        let comments = Comments(&issue);
        match &issue.kind {
            IssueKind::ExpectationFailed(expectation) => tracing::error!(
                location = %issue.source_location,
                expression = %expectation.evaluated_expression,
                required = expectation.is_required,
                comments = %comments,
                "expectation failed"
            ),
            IssueKind::System { description } => tracing::warn!(
                location = %issue.source_location,
                comments = %comments,
                "{description}"
            ),
        }
    }
}

struct Comments<'a>(&'a Issue);

impl fmt::Display for Comments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comment) in self.0.comments.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{comment}")?;
        }
        Ok(())
    }
}

/// Keeps every recorded issue in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    issues: Mutex<Vec<Issue>>,
}

impl RecordingReporter {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        self.issues.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.issues.lock())
    }

    /// Number of recorded issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.lock().is_empty()
    }

    /// Number of recorded expectation failures.
    #[must_use]
    pub fn expectation_failures(&self) -> usize {
        self.issues
            .lock()
            .iter()
            .filter(|issue| issue.is_expectation_failure())
            .count()
    }

    /// Number of recorded system issues.
    #[must_use]
    pub fn system_issues(&self) -> usize {
        self.issues
            .lock()
            .iter()
            .filter(|issue| issue.is_system())
            .count()
    }
}

impl IssueReporter for RecordingReporter {
    fn record(&self, issue: Issue) {
        self.issues.lock().push(issue);
    }
}
