#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Vigil Expect
//!
//! Polling confirmations for async tests, built on `vigil-polling`.
//!
//! This crate provides:
//! - [`Suite`] and [`TestContext`] -- scopes carrying [`PollingTrait`]s, a reporting sink and a cancellation token
//! - [`Confirmation`] -- call-site builder with boolean, value, fallible and error-matching forms
//! - [`IssueReporter`] -- the sink failures are handed to, with [`TracingReporter`] and [`RecordingReporter`]
//! - [`ExpectError`] -- what a failing confirmation returns
//!
//! Every failure is reported exactly once and returned as an error, so tests
//! can keep going or abort with `?`. An invalid duration/interval pair is
//! misuse: the confirmation panics at its call site before the condition
//! runs, and nothing is reported.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vigil_expect::{PollingTrait, RecordingReporter, Suite, TestContext};
//!
//! # async fn example() -> vigil_expect::ExpectResult {
//! let suite = Arc::new(Suite::new("cache").with_trait(PollingTrait::new().duration(Duration::from_millis(500))));
//! let reporter = Arc::new(RecordingReporter::new());
//! let ctx = TestContext::new("warms_up").in_suite(suite).with_reporter(reporter.clone());
//!
//! let entries = ctx
//!     .until_passes()
//!     .interval(Duration::from_millis(5))
//!     .comment("cache fills in the background")
//!     .returns(|| async { Some(42_usize) })
//!     .await?;
//! assert_eq!(entries, 42);
//! assert!(reporter.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod confirm;
pub mod error;
pub mod issue;
pub mod reporter;
pub mod scope;

pub use adapter::OutcomeAdapter;
pub use confirm::{Confirmation, poll_until_passes, poll_while_passes};
pub use error::{ExpectError, ExpectResult, FailureReason};
pub use issue::{Comment, Expectation, Issue, IssueKind, SourceLocation};
pub use reporter::{IssueReporter, RecordingReporter, TracingReporter};
pub use scope::{Suite, TestContext};

pub use vigil_polling::{
    ConfigError, PollingBehavior, PollingConfiguration, PollingOverrides, PollingTrait,
};
