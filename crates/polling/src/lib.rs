#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Vigil Polling
//!
//! Bounded polling engine for async conditions.
//!
//! This crate provides:
//! - [`PollingBehavior`] -- the two stopping policies
//! - [`PollingConfiguration`] -- validated duration/interval pair with layered resolution
//! - [`Processor`] -- serialized decision state shared by the racing activities
//! - [`PollEngine`] -- races a timer against an evaluation loop under one cancellation scope
//! - [`ValueRecorder`] -- keeps the last value produced by a value-returning condition
//!
//! The engine never reports anything itself. It returns a [`PollReport`] and
//! leaves translation into test issues to the caller (see `vigil-expect`).
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vigil_polling::{PollOutcome, PollingBehavior, poll};
//!
//! # async fn example() {
//! let outcome = poll(
//!     || async { true },
//!     PollingBehavior::PassesOnce,
//!     Duration::from_millis(100),
//! )
//! .await;
//! assert_eq!(outcome, PollOutcome::Finished);
//! # }
//! ```

pub mod behavior;
pub mod config;
pub mod engine;
pub mod evaluate;
pub mod processor;
pub mod recorder;

pub use behavior::PollingBehavior;
pub use config::{ConfigError, ConfigResult, PollingConfiguration, PollingOverrides, PollingTrait};
pub use engine::{PollEngine, PollReport, poll};
pub use evaluate::{
    AnyError, ErrorEquals, ErrorMatcher, Evaluator, Fallible, MatchWith, PredicateFn,
};
pub use processor::{PollOutcome, Processor};
pub use recorder::{Produced, ValueRecorder};
