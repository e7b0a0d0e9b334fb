//! The caller-facing confirmation surface.
//!
//! A [`Confirmation`] is built from a [`TestContext`], tuned with call-site
//! overrides and comments, then consumed by one of the condition forms:
//!
//! | Form | Condition | Passes when |
//! |---|---|---|
//! | [`passes`](Confirmation::passes) | `bool` | `true` |
//! | [`returns`](Confirmation::returns) | `Option<R>` or `Result<Option<R>, E>` | a value was produced |
//! | [`passes_fallible`](Confirmation::passes_fallible) | `Result<bool, E>` | `Ok(true)` |
//! | [`passes_or_raises`](Confirmation::passes_or_raises) | `Result<bool, E>` | `Ok(true)` or the expected error |
//! | [`passes_or_raises_matching`](Confirmation::passes_or_raises_matching) | `Result<bool, E>` | `Ok(true)` or an error the matcher accepts |
//!
//! Errors raised by a condition never escape a confirmation.
//!
//! # Panics
//!
//! Every form panics before evaluating the condition when the resolved
//! duration/interval pair is invalid. The message names the call site and
//! the [`ConfigError`](vigil_polling::ConfigError).

use std::future::Future;
use std::time::Duration;

use vigil_polling::{
    ErrorEquals, Evaluator, Fallible, MatchWith, PollEngine, PollReport, PollingBehavior,
    PollingOverrides, PredicateFn, Produced, ValueRecorder,
};

use crate::adapter::OutcomeAdapter;
use crate::error::{ExpectResult, FailureReason};
use crate::issue::{Comment, SourceLocation};
use crate::scope::TestContext;

/// One pending confirmation.
#[derive(Debug)]
#[must_use = "a confirmation does nothing until a condition is supplied"]
pub struct Confirmation<'a> {
    context: &'a TestContext,
    behavior: PollingBehavior,
    overrides: PollingOverrides,
    comments: Vec<Comment>,
    description: Option<String>,
    required: bool,
    source_location: SourceLocation,
}

impl<'a> Confirmation<'a> {
    #[track_caller]
    pub(crate) fn new(context: &'a TestContext, behavior: PollingBehavior) -> Self {
        Self {
            context,
            behavior,
            overrides: PollingOverrides::none(),
            comments: Vec::new(),
            description: None,
            required: false,
            source_location: SourceLocation::caller(),
        }
    }

    /// Override the polling duration at the call site.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.overrides.duration = Some(duration);
        self
    }

    /// Override the polling interval at the call site.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.overrides.interval = Some(interval);
        self
    }

    /// Apply every field set in `overrides`.
    pub fn overrides(mut self, overrides: PollingOverrides) -> Self {
        self.overrides = overrides.or(self.overrides);
        self
    }

    /// Attach a comment to any reported issue.
    pub fn comment(mut self, comment: impl Into<Comment>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Describe the condition in reported issues.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the confirmation as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The stopping policy.
    pub fn behavior(&self) -> PollingBehavior {
        self.behavior
    }

    /// Where the confirmation was written.
    pub fn source_location(&self) -> SourceLocation {
        self.source_location
    }

    /// Poll a boolean condition.
    pub async fn passes<F, Fut>(self, predicate: F) -> ExpectResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.drive(&mut PredicateFn::new(predicate)).await.map(drop)
    }

    /// Poll a value-producing condition and return the last value it produced.
    ///
    /// `None` (or an `Err`) counts as a failing evaluation.
    pub async fn returns<F, Fut, P, R>(self, producer: F) -> ExpectResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = P>,
        P: Produced<Value = R>,
    {
        let mut recorder = ValueRecorder::new(producer);
        let report = self.drive(&mut recorder).await?;
        recorder
            .into_value()
            .ok_or_else(|| self.adapter().fail(report, FailureReason::NoValueRecorded))
    }

    /// Poll a condition that may raise. Errors count as failing evaluations.
    pub async fn passes_fallible<F, Fut, E>(self, predicate: F) -> ExpectResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.drive(&mut Fallible::new(predicate)).await.map(drop)
    }

    /// Poll a condition that may raise; raising `expected` counts as a pass.
    pub async fn passes_or_raises<F, Fut, E>(self, expected: E, predicate: F) -> ExpectResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: PartialEq,
    {
        let mut evaluator = Fallible::new(predicate).matching(ErrorEquals::new(expected));
        self.drive(&mut evaluator).await.map(drop)
    }

    /// Poll a condition that may raise; `matcher` decides whether an error
    /// counts as a pass.
    pub async fn passes_or_raises_matching<F, Fut, E, M, MFut>(
        self,
        matcher: M,
        predicate: F,
    ) -> ExpectResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        M: FnMut(E) -> MFut,
        MFut: Future<Output = bool>,
    {
        let mut evaluator = Fallible::new(predicate).matching(MatchWith::new(matcher));
        self.drive(&mut evaluator).await.map(drop)
    }

    async fn drive<E: Evaluator>(&self, evaluator: &mut E) -> ExpectResult<PollReport> {
        // Misuse aborts the test before the condition runs; nothing is reported.
        let config = match self
            .context
            .resolve_configuration(self.behavior, &self.overrides)
        {
            Ok(config) => config,
            Err(error) => panic!(
                "{}: invalid polling configuration: {error}",
                self.source_location
            ),
        };

        let engine = PollEngine::from_configuration(self.behavior, &config)
            .with_cancellation(self.context.cancellation().clone());
        let report = engine.run(evaluator).await;

        self.adapter().settle(report)
    }

    fn adapter(&self) -> OutcomeAdapter<'_> {
        let expression = self
            .description
            .as_deref()
            .unwrap_or(self.behavior.describe());
        OutcomeAdapter::new(self.context.reporter(), expression, self.source_location)
            .required(self.required)
            .with_comments(&self.comments)
    }
}

/// Confirm that `predicate` passes at least once in the resolved window.
#[track_caller]
pub fn poll_until_passes<'a, F, Fut>(
    context: &'a TestContext,
    overrides: PollingOverrides,
    predicate: F,
) -> impl Future<Output = ExpectResult> + 'a
where
    F: FnMut() -> Fut + 'a,
    Fut: Future<Output = bool> + 'a,
{
    context.until_passes().overrides(overrides).passes(predicate)
}

/// Confirm that `predicate` keeps passing for the whole resolved window.
#[track_caller]
pub fn poll_while_passes<'a, F, Fut>(
    context: &'a TestContext,
    overrides: PollingOverrides,
    predicate: F,
) -> impl Future<Output = ExpectResult> + 'a
where
    F: FnMut() -> Fut + 'a,
    Fut: Future<Output = bool> + 'a,
{
    context.while_passes().overrides(overrides).passes(predicate)
}
