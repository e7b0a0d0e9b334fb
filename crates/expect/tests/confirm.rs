//! End-to-end confirmations against a recording reporter.

use std::any::Any;
use std::future::ready;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::FutureExt;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use vigil_expect::{
    ConfigError, ExpectError, FailureReason, PollingBehavior, PollingOverrides, PollingTrait,
    RecordingReporter, Suite, TestContext, poll_until_passes, poll_while_passes,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_default()
}

fn context() -> (TestContext, Arc<RecordingReporter>) {
    init_tracing();
    let reporter = Arc::new(RecordingReporter::new());
    let ctx = TestContext::new("confirm").with_reporter(reporter.clone());
    (ctx, reporter)
}

#[tokio::test]
async fn passing_condition_reports_nothing() {
    let (ctx, reporter) = context();
    let mut calls = 0;

    ctx.until_passes()
        .duration(ms(500))
        .passes(|| {
            calls += 1;
            ready(calls == 3)
        })
        .await
        .unwrap();

    assert_eq!(calls, 3);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn never_passing_condition_reports_exactly_one_issue() {
    let (ctx, reporter) = context();

    let err = ctx
        .until_passes()
        .duration(ms(50))
        .comment("queue should drain after the flush")
        .passes(|| ready(false))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), Some(FailureReason::NeverPassed));
    let issues = reporter.take();
    assert_eq!(issues.len(), 1);
    let expectation = issues[0].expectation().unwrap();
    assert!(!expectation.is_passing);
    assert!(!expectation.is_required);
    assert_eq!(issues[0].comments[0].as_str(), "queue should drain after the flush");
    assert!(issues[0].source_location.file.ends_with("confirm.rs"));
}

#[tokio::test]
async fn while_passes_stops_on_first_failure() {
    let (ctx, reporter) = context();
    let calls = AtomicU32::new(0);

    let err = ctx
        .while_passes()
        .duration(ms(5_000))
        .required()
        .passes(|| ready(calls.fetch_add(1, Ordering::SeqCst) < 4))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), Some(FailureReason::StoppedPassing));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(reporter.issues()[0].expectation().unwrap().is_required);
}

#[tokio::test]
async fn while_passes_holds_for_the_whole_window() {
    let (ctx, reporter) = context();
    poll_while_passes(&ctx, PollingOverrides::none().with_duration(ms(60)), || ready(true))
        .await
        .unwrap();
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn value_from_second_evaluation_is_returned() {
    let (ctx, reporter) = context();
    let mut calls = 0;

    let value = ctx
        .until_passes()
        .returns(|| {
            calls += 1;
            ready((calls == 2).then_some(5))
        })
        .await
        .unwrap();

    assert_eq!(value, 5);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn fallible_value_producer_treats_errors_as_absent() {
    let (ctx, _) = context();
    let mut calls = 0;

    let value = ctx
        .until_passes()
        .returns(|| {
            calls += 1;
            ready(match calls {
                1 => Err("not connected"),
                2 => Ok(None),
                _ => Ok(Some("ready")),
            })
        })
        .await
        .unwrap();

    assert_eq!(value, "ready");
}

#[tokio::test]
async fn value_producer_that_never_produces_fails() {
    let (ctx, reporter) = context();

    let err = ctx
        .until_passes()
        .duration(ms(30))
        .returns(|| ready(None::<u8>))
        .await
        .unwrap_err();

    assert!(err.is_expectation_failure());
    assert_eq!(reporter.expectation_failures(), 1);
}

#[tokio::test(start_paused = true)]
async fn call_site_interval_overrides_suite_interval() {
    let suite = Arc::new(
        Suite::new("replication").with_trait(PollingTrait::new().duration(ms(300)).interval(ms(50))),
    );
    let (ctx, _) = context();
    let ctx = ctx.in_suite(suite);

    let resolved = ctx
        .resolve_configuration(
            PollingBehavior::PassesAlways,
            &PollingOverrides::none().with_interval(ms(7)),
        )
        .unwrap();
    assert_eq!((resolved.duration(), resolved.interval()), (ms(300), ms(7)));

    let calls = AtomicU32::new(0);
    ctx.while_passes()
        .interval(ms(7))
        .passes(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(true)
        })
        .await
        .unwrap();

    // Roughly 300 / 7 evaluations; the suite interval alone would give six.
    let calls = calls.load(Ordering::SeqCst);
    assert!((30..=44).contains(&calls), "{calls} evaluations");
}

#[tokio::test]
#[should_panic(expected = "invalid polling configuration: polling interval (10ms) must be shorter than the duration (5ms)")]
async fn invalid_call_site_configuration_panics() {
    let (ctx, _) = context();
    let _ = ctx
        .until_passes()
        .duration(ms(5))
        .interval(ms(10))
        .passes(|| ready(false))
        .await;
}

#[tokio::test]
async fn invalid_configuration_aborts_before_evaluating_or_reporting() {
    let (ctx, reporter) = context();
    let calls = AtomicU32::new(0);
    let line = line!() + 3;

    let panicked = AssertUnwindSafe(
        ctx.until_passes()
            .duration(ms(5))
            .interval(ms(2_000))
            .passes(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(true)
            }),
    )
    .catch_unwind()
    .await
    .unwrap_err();

    let message = panic_message(panicked.as_ref());
    assert!(message.contains("must be shorter than the duration"), "{message}");
    assert!(message.contains(&format!("confirm.rs:{line}:")), "{message}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn invalid_suite_configuration_aborts_too() {
    let suite = Arc::new(Suite::new("broken").with_trait(PollingTrait::new().interval(ms(0))));
    let (ctx, reporter) = context();
    let ctx = ctx.in_suite(suite);

    let panicked = AssertUnwindSafe(ctx.until_passes().passes(|| ready(true)))
        .catch_unwind()
        .await
        .unwrap_err();

    let message = panic_message(panicked.as_ref());
    assert!(message.contains(&ConfigError::ZeroInterval.to_string()), "{message}");
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn cancelling_the_test_mid_poll_reports_a_system_issue() {
    let (ctx, reporter) = context();

    let (result, ()) = futures::join!(
        ctx.until_passes().duration(ms(10_000)).passes(|| ready(false)),
        async {
            tokio::time::sleep(ms(20)).await;
            ctx.cancel();
        }
    );

    let err = result.unwrap_err();
    assert!(err.is_system());
    assert!(matches!(err, ExpectError::Cancelled { .. }));
    assert_eq!(reporter.system_issues(), 1);
    assert_eq!(reporter.expectation_failures(), 0);
}

#[tokio::test]
async fn cancelled_parent_cancels_before_any_outcome() {
    let parent = CancellationToken::new();
    let (ctx, reporter) = context();
    let ctx = ctx.with_cancellation(&parent);
    parent.cancel();

    let err = poll_until_passes(&ctx, PollingOverrides::none(), || ready(false))
        .await
        .unwrap_err();

    assert!(err.is_system());
    assert_eq!(reporter.len(), 1);
}
