//! Value capture for value-producing conditions.
//!
//! A [`ValueRecorder`] turns `FnMut() -> Future<Output = Option<R>>` into a
//! boolean condition: `Some` records the value and passes, `None` fails.
//!
//! There is no lock around the recorded value. The engine borrows the
//! recorder mutably for the whole race and only the evaluation activity
//! touches it; once [`PollEngine::run`](crate::PollEngine::run) returns the
//! borrow has ended and both activities are gone, so the caller reads the
//! value with nobody left to write it. The borrow checker enforces that
//! ordering.

use std::future::Future;

use crate::evaluate::Evaluator;

/// Output of a value-producing condition.
///
/// Implemented for `Option<R>` and for fallible `Result<Option<R>, E>`, where
/// an error counts as "no value".
pub trait Produced {
    /// The recorded value type.
    type Value;

    /// The value, if this evaluation produced one.
    fn into_value(self) -> Option<Self::Value>;
}

impl<R> Produced for Option<R> {
    type Value = R;

    fn into_value(self) -> Option<R> {
        self
    }
}

impl<R, E> Produced for Result<Option<R>, E> {
    type Value = R;

    fn into_value(self) -> Option<R> {
        self.ok().flatten()
    }
}

/// Keeps the last value a condition produced.
#[derive(Debug)]
pub struct ValueRecorder<F, R> {
    producer: F,
    last: Option<R>,
    recorded: u64,
}

impl<F, R> ValueRecorder<F, R> {
    /// Wrap a value-producing closure. Fresh per poll.
    pub fn new<Fut, P>(producer: F) -> Self
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = P>,
        P: Produced<Value = R>,
    {
        Self {
            producer,
            last: None,
            recorded: 0,
        }
    }

    /// The last recorded value, if any.
    pub fn last_value(&self) -> Option<&R> {
        self.last.as_ref()
    }

    /// How many evaluations produced a value.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Consume the recorder, yielding the last recorded value.
    pub fn into_value(self) -> Option<R> {
        self.last
    }
}

impl<F, Fut, P, R> Evaluator for ValueRecorder<F, R>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = P>,
    P: Produced<Value = R>,
{
    async fn evaluate(&mut self) -> bool {
        match (self.producer)().await.into_value() {
            Some(value) => {
                self.last = Some(value);
                self.recorded += 1;
                true
            }
            None => false,
        }
    }
}
