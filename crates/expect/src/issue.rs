//! Issues handed to a reporting sink.

use std::fmt;
use std::panic::Location;

/// Where a confirmation was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source file path.
    pub file: &'static str,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl SourceLocation {
    /// Location of the caller (through any `#[track_caller]` frames).
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Free-form text attached to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment(String);

impl Comment {
    /// The comment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Comment {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl From<String> for Comment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The expectation a failed confirmation stood for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// What was being confirmed.
    pub evaluated_expression: String,
    /// Whether the expectation held.
    pub is_passing: bool,
    /// Whether the caller marked the confirmation as required.
    pub is_required: bool,
    /// Where the confirmation was written.
    pub source_location: SourceLocation,
}

/// What kind of problem an issue records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A condition did not behave as expected.
    ExpectationFailed(Expectation),
    /// Something outside the condition stopped the confirmation.
    System {
        /// What happened.
        description: String,
    },
}

/// A recorded problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// The problem.
    pub kind: IssueKind,
    /// Caller-supplied comments.
    pub comments: Vec<Comment>,
    /// Where the confirmation was written.
    pub source_location: SourceLocation,
}

impl Issue {
    /// Whether this records a failed expectation.
    #[must_use]
    pub const fn is_expectation_failure(&self) -> bool {
        matches!(self.kind, IssueKind::ExpectationFailed(_))
    }

    /// Whether this records a system-level problem.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.kind, IssueKind::System { .. })
    }

    /// The failed expectation, if any.
    #[must_use]
    pub fn expectation(&self) -> Option<&Expectation> {
        match &self.kind {
            IssueKind::ExpectationFailed(expectation) => Some(expectation),
            IssueKind::System { .. } => None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::ExpectationFailed(expectation) => {
                write!(
                    f,
                    "{}: expectation failed: {}",
                    self.source_location, expectation.evaluated_expression
                )?;
            }
            IssueKind::System { description } => {
                write!(f, "{}: {description}", self.source_location)?;
            }
        }
        for comment in &self.comments {
            write!(f, "\n  // {comment}")?;
        }
        Ok(())
    }
}
