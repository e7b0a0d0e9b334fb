//! Serialized decision state shared by the timer and the evaluation loop.

use std::fmt;

use parking_lot::Mutex;

use crate::behavior::PollingBehavior;

/// Terminal result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollOutcome {
    /// The timer fired after at least one evaluation completed.
    TimedOut,
    /// The timer fired before any evaluation completed.
    TimedOutWithoutRunning,
    /// The stopping condition was satisfied.
    Finished,
    /// The stopping condition was violated.
    Failed,
    /// The enclosing scope was cancelled from outside the poll.
    Cancelled,
}

impl PollOutcome {
    /// Whether the outcome counts as a pass.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out"),
            Self::TimedOutWithoutRunning => write!(f, "timed out before the first evaluation"),
            Self::Finished => write!(f, "finished"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug)]
struct ProcessorState {
    behavior: PollingBehavior,
    has_run: bool,
}

/// Maps the behavior and the evaluation history to an outcome.
///
/// Both operations take the same lock, so a timeout and an evaluation result
/// are never decided concurrently.
#[derive(Debug)]
pub struct Processor {
    state: Mutex<ProcessorState>,
}

impl Processor {
    /// Fresh state for one poll.
    #[must_use]
    pub const fn new(behavior: PollingBehavior) -> Self {
        Self {
            state: Mutex::new(ProcessorState {
                behavior,
                has_run: false,
            }),
        }
    }

    /// The timer fired. Always terminal.
    pub fn on_timeout(&self) -> PollOutcome {
        let state = self.state.lock();
        if !state.has_run {
            return PollOutcome::TimedOutWithoutRunning;
        }
        match state.behavior {
            PollingBehavior::PassesOnce => PollOutcome::TimedOut,
            PollingBehavior::PassesAlways => PollOutcome::Finished,
        }
    }

    /// One evaluation completed. `None` means keep polling.
    pub fn on_evaluation_result(&self, passed: bool) -> Option<PollOutcome> {
        let mut state = self.state.lock();
        state.has_run = true;
        match (state.behavior, passed) {
            (PollingBehavior::PassesOnce, true) => Some(PollOutcome::Finished),
            (PollingBehavior::PassesAlways, false) => Some(PollOutcome::Failed),
            _ => None,
        }
    }

    #[cfg(test)]
    fn has_run(&self) -> bool {
        self.state.lock().has_run
    }
}
