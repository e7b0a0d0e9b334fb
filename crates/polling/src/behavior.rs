//! Stopping policies for a poll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the evaluation history decides when polling stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingBehavior {
    /// Succeed on the first passing evaluation; fail if the timeout is
    /// reached before any evaluation passed.
    PassesOnce,
    /// Fail on the first failing evaluation; succeed if the timeout is
    /// reached while every evaluation so far passed.
    PassesAlways,
}

impl PollingBehavior {
    /// Short human-readable description used in issues and log fields.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::PassesOnce => "condition passes eventually",
            Self::PassesAlways => "condition keeps passing",
        }
    }
}

impl fmt::Display for PollingBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassesOnce => write!(f, "passes-once"),
            Self::PassesAlways => write!(f, "passes-always"),
        }
    }
}
