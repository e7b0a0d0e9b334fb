//! Race orchestrator: a timer and an evaluation loop under one cancellation scope.
//!
//! Each run opens a child scope of the engine's cancellation token and
//! drives exactly two activities inside a single `tokio::select!`:
//!
//! - the **timer** sleeps for the timeout and asks the [`Processor`] for a
//!   timeout outcome; cancellation wakes it early and it then stays silent
//! - the **evaluation loop** evaluates the condition, feeds each result to the
//!   [`Processor`] and returns on the first terminal outcome, or `Cancelled`
//!   when the scope is cancelled from outside
//!
//! The first activity to produce an outcome wins. Both activities are futures
//! owned by the run itself, so when it returns the loser (and any predicate
//! future it was awaiting) has already been dropped, and the scope is
//! cancelled for anything the condition handed it to.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::behavior::PollingBehavior;
use crate::config::PollingConfiguration;
use crate::evaluate::{Evaluator, PredicateFn};
use crate::processor::{PollOutcome, Processor};

/// What one engine run observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// The decided outcome.
    pub outcome: PollOutcome,
    /// Completed evaluations.
    pub evaluations: u64,
    /// Wall time from start to decision.
    pub elapsed: Duration,
}

/// Configured poll, reusable across runs.
#[derive(Debug, Clone)]
pub struct PollEngine {
    behavior: PollingBehavior,
    timeout: Duration,
    spacing: Option<Duration>,
    cancellation: CancellationToken,
}

impl PollEngine {
    /// Poll with `behavior` for at most `timeout`, evaluating back to back.
    #[must_use]
    pub fn new(behavior: PollingBehavior, timeout: Duration) -> Self {
        Self {
            behavior,
            timeout,
            spacing: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Poll for the configured duration, waiting the configured interval
    /// between evaluations.
    #[must_use]
    pub fn from_configuration(behavior: PollingBehavior, config: &PollingConfiguration) -> Self {
        Self::new(behavior, config.duration()).with_spacing(config.interval())
    }

    /// Wait at least `spacing` between two evaluations.
    #[must_use]
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Run inside `parent`: cancelling it cancels any in-flight run.
    #[must_use]
    pub fn with_cancellation(mut self, parent: CancellationToken) -> Self {
        self.cancellation = parent;
        self
    }

    /// The stopping policy.
    #[must_use]
    pub const fn behavior(&self) -> PollingBehavior {
        self.behavior
    }

    /// The timer duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Minimum spacing between evaluations, if any.
    #[must_use]
    pub const fn spacing(&self) -> Option<Duration> {
        self.spacing
    }

    /// Race the timer against the evaluation loop and report the winner.
    ///
    /// The evaluator is borrowed for the whole race; when this returns
    /// nothing else holds it.
    #[tracing::instrument(name = "poll", skip_all, fields(
        behavior = %self.behavior,
        timeout_ms = self.timeout.as_millis() as u64,
        spacing_ms = self.spacing.map(|s| s.as_millis() as u64),
    ))]
    pub async fn run<E: Evaluator>(&self, evaluator: &mut E) -> PollReport {
        let processor = Processor::new(self.behavior);
        let scope = self.cancellation.child_token();
        // Cancels the scope even if the caller drops this future mid-race.
        let _scope_guard = scope.clone().drop_guard();
        let started = Instant::now();
        let mut evaluations = 0;

        let outcome = {
            let timer = timer_activity(&processor, &scope, self.timeout);
            let evaluation =
                evaluation_activity(&processor, &scope, evaluator, self.spacing, &mut evaluations);

            tokio::select! {
                Some(outcome) = timer => outcome,
                outcome = evaluation => outcome,
                else => PollOutcome::TimedOut,
            }
        };
        scope.cancel();

        let elapsed = started.elapsed();
        tracing::debug!(
            %outcome,
            evaluations,
            elapsed_ms = elapsed.as_millis() as u64,
            "poll decided"
        );

        PollReport {
            outcome,
            evaluations,
            elapsed,
        }
    }

    /// [`run`](Self::run) for a plain async predicate.
    pub async fn run_predicate<F, Fut>(&self, predicate: F) -> PollReport
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.run(&mut PredicateFn::new(predicate)).await
    }
}

/// Poll `predicate` with `behavior` for at most `timeout`.
pub async fn poll<F, Fut>(predicate: F, behavior: PollingBehavior, timeout: Duration) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    PollEngine::new(behavior, timeout)
        .run_predicate(predicate)
        .await
        .outcome
}

async fn timer_activity(
    processor: &Processor,
    scope: &CancellationToken,
    timeout: Duration,
) -> Option<PollOutcome> {
    tokio::select! {
        () = tokio::time::sleep(timeout) => Some(processor.on_timeout()),
        () = scope.cancelled() => None,
    }
}

async fn evaluation_activity<E: Evaluator>(
    processor: &Processor,
    scope: &CancellationToken,
    evaluator: &mut E,
    spacing: Option<Duration>,
    evaluations: &mut u64,
) -> PollOutcome {
    while !scope.is_cancelled() {
        let passed = tokio::select! {
            biased;
            () = scope.cancelled() => break,
            passed = evaluator.evaluate() => passed,
        };
        *evaluations += 1;
        tracing::trace!(evaluation = *evaluations, passed, "evaluated condition");

        if let Some(outcome) = processor.on_evaluation_result(passed) {
            return outcome;
        }

        match spacing {
            Some(spacing) => tokio::select! {
                biased;
                () = scope.cancelled() => break,
                () = tokio::time::sleep(spacing) => {}
            },
            // Lets the timer run even when the condition never suspends.
            None => tokio::task::yield_now().await,
        }
    }
    PollOutcome::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{pending, ready};

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn passes_once_stops_on_first_pass() {
        let mut calls = 0;
        let report = PollEngine::new(PollingBehavior::PassesOnce, Duration::from_secs(5))
            .run_predicate(|| {
                calls += 1;
                ready(calls == 3)
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Finished);
        assert_eq!(report.evaluations, 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn passes_always_stops_on_first_failure() {
        let mut calls = 0;
        let report = PollEngine::new(PollingBehavior::PassesAlways, Duration::from_secs(5))
            .run_predicate(|| {
                calls += 1;
                ready(calls < 4)
            })
            .await;

        assert_eq!(report.outcome, PollOutcome::Failed);
        assert_eq!(report.evaluations, 4);
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn never_passing_times_out() {
        let outcome = poll(|| ready(false), PollingBehavior::PassesOnce, SHORT).await;
        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn always_passing_finishes_at_timeout() {
        let outcome = poll(|| ready(true), PollingBehavior::PassesAlways, SHORT).await;
        assert_eq!(outcome, PollOutcome::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_condition_times_out_without_running() {
        let report = PollEngine::new(PollingBehavior::PassesOnce, SHORT)
            .run_predicate(pending::<bool>)
            .await;

        assert_eq!(report.outcome, PollOutcome::TimedOutWithoutRunning);
        assert_eq!(report.evaluations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_parent_yields_cancelled() {
        let parent = CancellationToken::new();
        parent.cancel();

        let report = PollEngine::new(PollingBehavior::PassesOnce, SHORT)
            .with_cancellation(parent)
            .run_predicate(|| ready(false))
            .await;

        assert_eq!(report.outcome, PollOutcome::Cancelled);
        assert_eq!(report.evaluations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spacing_limits_evaluation_count() {
        let report = PollEngine::new(PollingBehavior::PassesOnce, Duration::from_millis(100))
            .with_spacing(Duration::from_millis(30))
            .run_predicate(|| ready(false))
            .await;

        // Evaluations at t = 0, 30, 60 and 90ms.
        assert_eq!(report.outcome, PollOutcome::TimedOut);
        assert_eq!(report.evaluations, 4);
    }

    #[test]
    fn from_configuration_uses_interval_as_spacing() {
        let config =
            PollingConfiguration::new(Duration::from_millis(400), Duration::from_millis(20))
                .unwrap();
        let engine = PollEngine::from_configuration(PollingBehavior::PassesAlways, &config);
        assert_eq!(engine.timeout(), Duration::from_millis(400));
        assert_eq!(engine.spacing(), Some(Duration::from_millis(20)));
        assert_eq!(engine.behavior(), PollingBehavior::PassesAlways);
    }
}
