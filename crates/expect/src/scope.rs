//! Suite and test scopes carrying polling traits.
//!
//! Suites form a chain through their parents. A test belongs to at most one
//! suite and inherits the traits of that suite and of every enclosing one,
//! nearest first.

use std::fmt;
use std::iter;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vigil_polling::{
    ConfigResult, PollingBehavior, PollingConfiguration, PollingOverrides, PollingTrait,
};

use crate::confirm::Confirmation;
use crate::reporter::{IssueReporter, TracingReporter};

/// A named group of tests, optionally nested in another suite.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    name: String,
    traits: Vec<PollingTrait>,
    parent: Option<Arc<Suite>>,
}

impl Suite {
    /// A top-level suite with no traits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            traits: Vec::new(),
            parent: None,
        }
    }

    /// Declare a polling trait. Later declarations win per field.
    #[must_use]
    pub fn with_trait(mut self, polling: PollingTrait) -> Self {
        self.traits.push(polling);
        self
    }

    /// Nest this suite inside `parent`.
    #[must_use]
    pub fn nested_in(mut self, parent: Arc<Self>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The suite's own name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Traits declared on this suite, in declaration order.
    #[must_use]
    pub fn traits(&self) -> &[PollingTrait] {
        &self.traits
    }

    /// The enclosing suite, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// This suite followed by its ancestors, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &Self> {
        iter::successors(Some(self), |suite| suite.parent.as_deref())
    }

    /// `outer::inner` style path from the root suite.
    #[must_use]
    pub fn path(&self) -> String {
        let mut names: Vec<&str> = self.ancestry().map(Self::name).collect();
        names.reverse();
        names.join("::")
    }
}

/// The test a confirmation runs in.
///
/// Owns the reporting sink and the cancellation token of the test. Every
/// poll started from this context runs in a child scope of that token.
#[derive(Clone)]
pub struct TestContext {
    name: String,
    traits: Vec<PollingTrait>,
    suite: Option<Arc<Suite>>,
    reporter: Arc<dyn IssueReporter>,
    cancellation: CancellationToken,
}

impl TestContext {
    /// A test outside any suite, reporting through [`TracingReporter`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            traits: Vec::new(),
            suite: None,
            reporter: Arc::new(TracingReporter),
            cancellation: CancellationToken::new(),
        }
    }

    /// Report issues to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn IssueReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Place the test in `suite`.
    #[must_use]
    pub fn in_suite(mut self, suite: Arc<Suite>) -> Self {
        self.suite = Some(suite);
        self
    }

    /// Declare a test-level polling trait. Later declarations win per field.
    #[must_use]
    pub fn with_trait(mut self, polling: PollingTrait) -> Self {
        self.traits.push(polling);
        self
    }

    /// Run inside `parent`: cancelling it cancels this test.
    #[must_use]
    pub fn with_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.cancellation = parent.child_token();
        self
    }

    /// The test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enclosing suite, if any.
    #[must_use]
    pub fn suite(&self) -> Option<&Arc<Suite>> {
        self.suite.as_ref()
    }

    /// The reporting sink.
    #[must_use]
    pub fn reporter(&self) -> &dyn IssueReporter {
        self.reporter.as_ref()
    }

    /// The test's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancel the test, and with it every in-flight poll.
    pub fn cancel(&self) {
        tracing::debug!(test = %self.name, "test cancelled");
        self.cancellation.cancel();
    }

    /// Whether the test was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolve the polling window for `behavior` given call-site overrides.
    pub fn resolve_configuration(
        &self,
        behavior: PollingBehavior,
        call_site: &PollingOverrides,
    ) -> ConfigResult<PollingConfiguration> {
        let test = PollingTrait::collapse(&self.traits, behavior);
        let suites = self
            .suite
            .as_deref()
            .into_iter()
            .flat_map(Suite::ancestry)
            .map(|suite| PollingTrait::collapse(&suite.traits, behavior));

        PollingConfiguration::resolve(call_site, Some(&test), suites)
    }

    /// Confirm that a condition passes at least once before the window closes.
    #[track_caller]
    #[must_use]
    pub fn until_passes(&self) -> Confirmation<'_> {
        Confirmation::new(self, PollingBehavior::PassesOnce)
    }

    /// Confirm that a condition keeps passing for the whole window.
    #[track_caller]
    #[must_use]
    pub fn while_passes(&self) -> Confirmation<'_> {
        Confirmation::new(self, PollingBehavior::PassesAlways)
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name)
            .field("traits", &self.traits)
            .field("suite", &self.suite.as_deref().map(Suite::path))
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
