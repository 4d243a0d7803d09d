//! Per-unit test context
//!
//! Handed to every test action. Carries the repetition index and the
//! non-fatal assertion sink used by [`check!`](crate::check) and
//! [`check_eq!`](crate::check_eq).

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::output::Reporter;

pub struct TestContext {
    suite: String,
    case: String,
    repetition: u32,
    reporter: Arc<dyn Reporter>,
    checks: AtomicUsize,
    failures: AtomicUsize,
}

impl TestContext {
    pub fn new(
        suite: impl Into<String>,
        case: impl Into<String>,
        repetition: u32,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            repetition,
            reporter,
            checks: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn case(&self) -> &str {
        &self.case
    }

    /// 1-based repetition index of this unit
    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    /// Print a line of test output through the run's reporter
    pub fn log(&self, message: impl Display) {
        self.reporter.line(&message.to_string());
    }

    /// Record a boolean check. Never panics; returns `passed`.
    pub fn record_check(&self, passed: bool, expr: &str, file: &str, line: u32) -> bool {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if !passed {
            self.failures.fetch_add(1, Ordering::Relaxed);
            self.reporter
                .line(&format!("Assertion failed in {file} at line {line}: {expr}"));
        }
        passed
    }

    /// Record an equality check. Never panics; returns whether the values matched.
    pub fn record_eq<E, A>(&self, expected: &E, actual: &A, file: &str, line: u32) -> bool
    where
        E: PartialEq<A> + Debug + ?Sized,
        A: Debug + ?Sized,
    {
        self.checks.fetch_add(1, Ordering::Relaxed);
        let passed = expected == actual;
        if !passed {
            self.failures.fetch_add(1, Ordering::Relaxed);
            self.reporter.line(&format!(
                "Assertion failed in {file} at line {line}: Expected {expected:?} == {actual:?}"
            ));
        }
        passed
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::Relaxed)
    }

    pub fn assertion_failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("suite", &self.suite)
            .field("case", &self.case)
            .field("repetition", &self.repetition)
            .field("checks", &self.checks())
            .field("failures", &self.assertion_failures())
            .finish()
    }
}

/// Non-fatal boolean assertion.
///
/// Prints `Assertion failed in <file> at line <line>: <expr>` on failure and
/// lets the action continue.
#[macro_export]
macro_rules! check {
    ($ctx:expr, $cond:expr $(,)?) => {
        $ctx.record_check($cond, stringify!($cond), file!(), line!())
    };
}

/// Non-fatal equality assertion.
///
/// Prints `Assertion failed in <file> at line <line>: Expected <e> == <a>`
/// on failure and lets the action continue.
#[macro_export]
macro_rules! check_eq {
    ($ctx:expr, $expected:expr, $actual:expr $(,)?) => {
        $ctx.record_eq(&$expected, &$actual, file!(), line!())
    };
}
