//! Polling configuration: validated duration/interval pairs and layered resolution.
//!
//! A concrete poll resolves each field independently, first non-absent wins:
//!
//! 1. the call site
//! 2. the nearest test-level [`PollingTrait`]
//! 3. the suite-level traits, nearest suite first
//! 4. the process-wide default (`1s` / `1ms` unless replaced)
//!
//! The resolved pair is validated afterwards. An invalid pair is a
//! [`ConfigError`], which callers must treat as misuse rather than as a
//! failing condition.

use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::behavior::PollingBehavior;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid duration/interval combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The polling duration was zero.
    #[error("polling duration must be greater than zero")]
    ZeroDuration,

    /// The polling interval was zero.
    #[error("polling interval must be greater than zero")]
    ZeroInterval,

    /// The interval does not fit at least twice into the duration window.
    #[error("polling interval ({interval:?}) must be shorter than the duration ({duration:?})")]
    IntervalNotShorter {
        /// Resolved duration.
        duration: Duration,
        /// Resolved interval.
        interval: Duration,
    },
}

/// A resolved, validated polling window.
///
/// Only constructed through [`PollingConfiguration::new`] or resolution, so
/// every instance satisfies the invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollingConfiguration {
    duration: Duration,
    interval: Duration,
}

static PROCESS_DEFAULT: RwLock<PollingConfiguration> = RwLock::new(PollingConfiguration::DEFAULT);

impl PollingConfiguration {
    /// Built-in process default: poll for one second, one millisecond apart.
    pub const DEFAULT: Self = Self {
        duration: Duration::from_secs(1),
        interval: Duration::from_millis(1),
    };

    /// Create a validated configuration.
    pub fn new(duration: Duration, interval: Duration) -> ConfigResult<Self> {
        let config = Self { duration, interval };
        config.validate()?;
        Ok(config)
    }

    /// How long the poll may run before the timer fires.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Minimum spacing between two evaluations.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Check the invariants: both values positive, interval shorter than duration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.interval >= self.duration {
            return Err(ConfigError::IntervalNotShorter {
                duration: self.duration,
                interval: self.interval,
            });
        }
        Ok(())
    }

    /// The current process-wide default.
    #[must_use]
    pub fn process_default() -> Self {
        *PROCESS_DEFAULT.read()
    }

    /// Replace the process-wide default, returning the previous one.
    ///
    /// The new value is validated first; on error the default is unchanged.
    pub fn set_process_default(config: Self) -> ConfigResult<Self> {
        config.validate()?;
        let previous = std::mem::replace(&mut *PROCESS_DEFAULT.write(), config);
        tracing::debug!(
            duration = ?config.duration,
            interval = ?config.interval,
            "replaced process-wide polling default"
        );
        Ok(previous)
    }

    /// Resolve a configuration from the call site, the test trait and the
    /// suite chain (nearest suite first), falling back to the process default.
    pub fn resolve<I>(
        call_site: &PollingOverrides,
        test: Option<&PollingOverrides>,
        suite_chain: I,
    ) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = PollingOverrides>,
    {
        let mut merged = *call_site;
        if let Some(test) = test {
            merged = merged.or(*test);
        }
        for suite in suite_chain {
            if merged.is_complete() {
                break;
            }
            merged = merged.or(suite);
        }

        let fallback = Self::process_default();
        let resolved = Self {
            duration: merged.duration.unwrap_or(fallback.duration),
            interval: merged.interval.unwrap_or(fallback.interval),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

impl Default for PollingConfiguration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Partially specified configuration contributed by one layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingOverrides {
    /// Duration override, if this layer sets one.
    pub duration: Option<Duration>,
    /// Interval override, if this layer sets one.
    pub interval: Option<Duration>,
}

impl PollingOverrides {
    /// An empty layer.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            duration: None,
            interval: None,
        }
    }

    /// Set the duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Whether this layer sets nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.duration.is_none() && self.interval.is_none()
    }

    /// Whether both fields are set.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.duration.is_some() && self.interval.is_some()
    }

    /// Fill absent fields from `fallback`. Fields already set win.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            duration: self.duration.or(fallback.duration),
            interval: self.interval.or(fallback.interval),
        }
    }
}

/// Declarative polling configuration attached to a test or a suite.
///
/// A trait without a `behavior` applies to both behaviors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingTrait {
    /// Restrict the trait to one behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<PollingBehavior>,

    /// Duration override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "humantime", serde(with = "humantime_serde"))]
    pub duration: Option<Duration>,

    /// Interval override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "humantime", serde(with = "humantime_serde"))]
    pub interval: Option<Duration>,
}

impl PollingTrait {
    /// A trait applying to every behavior.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            behavior: None,
            duration: None,
            interval: None,
        }
    }

    /// A trait applying to one behavior only.
    #[must_use]
    pub const fn for_behavior(behavior: PollingBehavior) -> Self {
        Self {
            behavior: Some(behavior),
            duration: None,
            interval: None,
        }
    }

    /// Set the duration.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Whether this trait participates when polling with `behavior`.
    #[must_use]
    pub fn applies_to(&self, behavior: PollingBehavior) -> bool {
        self.behavior.is_none_or(|own| own == behavior)
    }

    /// The overrides this trait contributes.
    #[must_use]
    pub const fn overrides(&self) -> PollingOverrides {
        PollingOverrides {
            duration: self.duration,
            interval: self.interval,
        }
    }

    /// Collapse the traits of one scope into a single layer.
    ///
    /// Only traits applying to `behavior` count; the last declared wins per field.
    #[must_use]
    pub fn collapse<'a, I>(traits: I, behavior: PollingBehavior) -> PollingOverrides
    where
        I: IntoIterator<Item = &'a Self>,
    {
        traits
            .into_iter()
            .filter(|t| t.applies_to(behavior))
            .fold(PollingOverrides::none(), |acc, t| t.overrides().or(acc))
    }
}
