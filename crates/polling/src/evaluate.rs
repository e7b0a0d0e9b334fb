//! Conditions the engine can evaluate.
//!
//! The engine drives anything implementing [`Evaluator`] through `&mut`, so an
//! evaluator may keep state between evaluations (see
//! [`ValueRecorder`](crate::ValueRecorder)) without any locking.

use std::future::{Future, ready};

/// One step of a polled condition.
pub trait Evaluator {
    /// Evaluate the condition once. `true` means it currently holds.
    fn evaluate(&mut self) -> impl Future<Output = bool>;
}

/// Plain async predicate.
#[derive(Debug, Clone)]
pub struct PredicateFn<F> {
    predicate: F,
}

impl<F> PredicateFn<F> {
    /// Wrap a closure returning a `bool` future.
    pub const fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F, Fut> Evaluator for PredicateFn<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    fn evaluate(&mut self) -> impl Future<Output = bool> {
        (self.predicate)()
    }
}

/// Decides whether an error raised by a condition counts as a pass.
///
/// The error is consumed; it never leaves the evaluation.
pub trait ErrorMatcher<E> {
    /// `true` if `error` satisfies the condition.
    fn matches(&mut self, error: E) -> impl Future<Output = bool>;
}

/// Every error counts as a failing evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyError;

impl<E> ErrorMatcher<E> for AnyError {
    fn matches(&mut self, _error: E) -> impl Future<Output = bool> {
        ready(false)
    }
}

/// Passes when the raised error equals the expected one.
#[derive(Debug, Clone)]
pub struct ErrorEquals<E> {
    expected: E,
}

impl<E> ErrorEquals<E> {
    /// Expect exactly `expected`.
    pub const fn new(expected: E) -> Self {
        Self { expected }
    }
}

impl<E: PartialEq> ErrorMatcher<E> for ErrorEquals<E> {
    fn matches(&mut self, error: E) -> impl Future<Output = bool> {
        ready(error == self.expected)
    }
}

/// Passes when an async closure accepts the raised error.
#[derive(Debug, Clone)]
pub struct MatchWith<F> {
    matcher: F,
}

impl<F> MatchWith<F> {
    /// Wrap a closure `FnMut(E) -> impl Future<Output = bool>`.
    pub const fn new(matcher: F) -> Self {
        Self { matcher }
    }
}

impl<E, F, Fut> ErrorMatcher<E> for MatchWith<F>
where
    F: FnMut(E) -> Fut,
    Fut: Future<Output = bool>,
{
    fn matches(&mut self, error: E) -> impl Future<Output = bool> {
        (self.matcher)(error)
    }
}

/// Predicate that may raise. `Err` is routed through an [`ErrorMatcher`].
#[derive(Debug, Clone)]
pub struct Fallible<F, M = AnyError> {
    predicate: F,
    matcher: M,
}

impl<F> Fallible<F> {
    /// Errors count as a failing evaluation.
    pub const fn new(predicate: F) -> Self {
        Self {
            predicate,
            matcher: AnyError,
        }
    }
}

impl<F, M> Fallible<F, M> {
    /// Consult `matcher` when the predicate raises.
    pub fn matching<N>(self, matcher: N) -> Fallible<F, N> {
        Fallible {
            predicate: self.predicate,
            matcher,
        }
    }
}

impl<F, Fut, E, M> Evaluator for Fallible<F, M>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    M: ErrorMatcher<E>,
{
    async fn evaluate(&mut self) -> bool {
        match (self.predicate)().await {
            Ok(passed) => passed,
            Err(error) => {
                let accepted = self.matcher.matches(error).await;
                tracing::trace!(accepted, "condition raised an error");
                accepted
            }
        }
    }
}
