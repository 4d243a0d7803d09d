//! Test case records
//!
//! A [`TestCase`] is the declarative descriptor the scheduler consumes: a
//! name, an action, and the flags that shape how the action is dispatched.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ErrorKind, TestOutcome};
use crate::executor::TestContext;

/// Test action: receives the suite fixture and the per-unit context
pub type TestFn<F> = Arc<dyn Fn(&F, &TestContext) -> TestOutcome + Send + Sync>;

/// A single registered test case
pub struct TestCase<F> {
    name: String,
    action: TestFn<F>,
    disabled: bool,
    timeout: Option<Duration>,
    repetitions: u32,
    expected_error: Option<ErrorKind>,
    concurrent: bool,
    nondeterministic: bool,
}

impl<F> TestCase<F> {
    /// Create a test case with default flags (enabled, one repetition, no timeout)
    pub fn new<A>(name: impl Into<String>, action: A) -> Self
    where
        A: Fn(&F, &TestContext) -> TestOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Arc::new(action),
            disabled: false,
            timeout: None,
            repetitions: 1,
            expected_error: None,
            concurrent: false,
            nondeterministic: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Bound the action's run time; a zero duration disables the bound
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Run the action `count` times; zero is normalized to one
    pub fn repeat(mut self, count: u32) -> Self {
        self.repetitions = count.max(1);
        self
    }

    pub fn expect_error(mut self, kind: ErrorKind) -> Self {
        self.expected_error = Some(kind);
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }

    pub fn nondeterministic(mut self) -> Self {
        self.nondeterministic = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &TestFn<F> {
        &self.action
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn timeout_limit(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn expected_error(&self) -> Option<ErrorKind> {
        self.expected_error
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    pub fn is_nondeterministic(&self) -> bool {
        self.nondeterministic
    }

    /// Console label for one repetition of this case
    pub fn label(&self, repetition: u32) -> String {
        if self.repetitions > 1 {
            format!("{} (Repetition {repetition})", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn info(&self) -> CaseInfo {
        CaseInfo {
            name: self.name.clone(),
            disabled: self.disabled,
            timeout_ms: self.timeout.map(|t| t.as_millis() as u64),
            repetitions: self.repetitions,
            expected_error: self.expected_error,
            concurrent: self.concurrent,
            nondeterministic: self.nondeterministic,
        }
    }
}

impl<F> Clone for TestCase<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            action: Arc::clone(&self.action),
            disabled: self.disabled,
            timeout: self.timeout,
            repetitions: self.repetitions,
            expected_error: self.expected_error,
            concurrent: self.concurrent,
            nondeterministic: self.nondeterministic,
        }
    }
}

impl<F> fmt::Debug for TestCase<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("disabled", &self.disabled)
            .field("timeout", &self.timeout)
            .field("repetitions", &self.repetitions)
            .field("expected_error", &self.expected_error)
            .field("concurrent", &self.concurrent)
            .field("nondeterministic", &self.nondeterministic)
            .finish_non_exhaustive()
    }
}

/// Fixture-independent description of a case, used for listings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseInfo {
    pub name: String,
    pub disabled: bool,
    pub timeout_ms: Option<u64>,
    pub repetitions: u32,
    pub expected_error: Option<ErrorKind>,
    pub concurrent: bool,
    pub nondeterministic: bool,
}

impl CaseInfo {
    /// Short flag list, e.g. `[concurrent, x3, timeout=200ms]`
    pub fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.disabled {
            flags.push("disabled".to_string());
        }
        if self.concurrent {
            flags.push("concurrent".to_string());
        }
        if self.nondeterministic {
            flags.push("nondeterministic".to_string());
        }
        if self.repetitions > 1 {
            flags.push(format!("x{}", self.repetitions));
        }
        if let Some(ms) = self.timeout_ms {
            flags.push(format!("timeout={ms}ms"));
        }
        if let Some(kind) = self.expected_error {
            flags.push(format!("expects={kind}"));
        }
        if flags.is_empty() {
            String::new()
        } else {
            format!("[{}]", flags.join(", "))
        }
    }
}
