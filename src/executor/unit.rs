//! Per-unit execution protocol
//!
//! One unit is one (case, repetition) pair. Both dispatch modes run a unit
//! the same way: `before_each`, the action (optionally under a timeout),
//! classification of what the action raised, then `after_each`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::context::TestContext;
use super::runner::TestRunner;
use crate::models::{
    ErrorKind, Fixture, Hook, Suite, TestCase, TestError, TestOutcome, UnitResult, UnitStatus,
    Verdict,
};

/// How an action call ended, before classification
#[derive(Debug)]
pub(crate) enum Completion {
    Returned(TestOutcome),
    TimedOut(Duration),
}

/// Run `f`, converting an escaping panic into a [`ErrorKind::Panic`] error
pub(crate) fn guard<Fun>(f: Fun) -> TestOutcome
where
    Fun: FnOnce() -> TestOutcome,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(TestError::from_panic(payload)))
}

/// Classify an action's completion against the case's expected error kind
pub(crate) fn classify(expected: Option<ErrorKind>, completion: Completion) -> Verdict {
    match (completion, expected) {
        (Completion::TimedOut(limit), _) => Verdict::TimedOut {
            timeout_ms: limit.as_millis() as u64,
        },
        (Completion::Returned(Ok(())), None) => Verdict::Passed,
        (Completion::Returned(Ok(())), Some(kind)) => Verdict::MissingExpected { kind },
        (Completion::Returned(Err(error)), None) => Verdict::Unexpected { error },
        (Completion::Returned(Err(error)), Some(kind)) if error.kind() == kind => {
            Verdict::ExpectedRaised { kind }
        }
        (Completion::Returned(Err(actual)), Some(expected)) => {
            Verdict::KindMismatch { expected, actual }
        }
    }
}

/// Console line for a failing verdict; `None` when there is nothing to report
pub(crate) fn failure_message(name: &str, label: &str, verdict: &Verdict) -> Option<String> {
    match verdict {
        Verdict::Passed | Verdict::ExpectedRaised { .. } | Verdict::Skipped => None,
        Verdict::MissingExpected { kind } => Some(format!(
            "Expected exception of type '{kind}' was not thrown in test '{name}'"
        )),
        Verdict::Unexpected { error } => Some(format!(
            "Unexpected exception thrown in test '{name}': {error}"
        )),
        Verdict::KindMismatch { expected, actual } => Some(format!(
            "Unexpected exception type thrown in test '{name}': expected '{expected}', got '{}': {}",
            actual.kind(),
            actual.message()
        )),
        Verdict::TimedOut { timeout_ms } => Some(format!(
            "Test case '{label}' timed out after {timeout_ms} ms"
        )),
        Verdict::HookFailed { hook, error } => {
            Some(format!("{hook} hook failed in test '{name}': {error}"))
        }
    }
}

impl TestRunner {
    /// Execute one repetition of a case against the suite's shared fixture
    pub(crate) fn run_unit<F: Fixture>(
        &self,
        suite: &Suite<F>,
        case: &TestCase<F>,
        repetition: u32,
    ) -> UnitResult {
        let label = case.label(repetition);
        self.reporter().line(&format!("Running Test Case: {label}"));
        debug!(suite = suite.name(), case = case.name(), repetition, "unit started");

        let fixture = suite.fixture();
        let ctx = Arc::new(TestContext::new(
            suite.name(),
            case.name(),
            repetition,
            Arc::clone(self.reporter()),
        ));
        let start = Instant::now();

        let mut verdict = match guard(|| fixture.before_each()) {
            Ok(()) => classify(case.expected_error(), self.invoke(fixture, case, &ctx)),
            Err(error) => Verdict::HookFailed {
                hook: Hook::BeforeEach,
                error,
            },
        };
        let assertion_failures = ctx.assertion_failures();
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Some(message) = failure_message(case.name(), &label, &verdict) {
            self.reporter().line(&message);
        }

        if let Err(error) = guard(|| fixture.after_each()) {
            let hook_failure = Verdict::HookFailed {
                hook: Hook::AfterEach,
                error,
            };
            if let Some(message) = failure_message(case.name(), &label, &hook_failure) {
                warn!("{message}");
                self.reporter().line(&message);
            }
            if verdict.status() == UnitStatus::Pass {
                verdict = hook_failure;
            }
        }

        debug!(
            suite = suite.name(),
            case = case.name(),
            repetition,
            status = %verdict.status(),
            duration_ms,
            "unit finished"
        );

        UnitResult::new(suite.name(), case.name(), repetition, verdict)
            .with_duration(duration_ms)
            .with_assertion_failures(assertion_failures)
            .with_nondeterministic(case.is_nondeterministic())
    }

    /// Call the action, on a watchdog-bounded blocking task when the case has a timeout.
    ///
    /// A timed-out task is abandoned, not cancelled: it keeps running in the
    /// background and may still touch the fixture or print output.
    fn invoke<F: Fixture>(
        &self,
        fixture: &Arc<F>,
        case: &TestCase<F>,
        ctx: &Arc<TestContext>,
    ) -> Completion {
        let Some(limit) = case.timeout_limit() else {
            let action = case.action();
            return Completion::Returned(guard(|| action(&**fixture, &**ctx)));
        };

        let action = Arc::clone(case.action());
        let fixture = Arc::clone(fixture);
        let task_ctx = Arc::clone(ctx);
        let handle = self.timer_handle();
        // The timer must be created inside the runtime, so build it in the async block
        let watched = panic::catch_unwind(AssertUnwindSafe(|| {
            let task = handle.spawn_blocking(move || guard(|| action(&*fixture, &*task_ctx)));
            handle.block_on(async move { tokio::time::timeout(limit, task).await })
        }));
        let watched = match watched {
            Ok(watched) => watched,
            Err(payload) => {
                let error = TestError::from_panic(payload);
                warn!(case = case.name(), "timeout watchdog failed: {error}");
                return Completion::Returned(Err(TestError::runtime(format!(
                    "timeout watchdog failed: {}",
                    error.message()
                ))));
            }
        };

        match watched {
            Ok(Ok(outcome)) => Completion::Returned(outcome),
            Ok(Err(join_error)) if join_error.is_panic() => {
                Completion::Returned(Err(TestError::from_panic(join_error.into_panic())))
            }
            Ok(Err(join_error)) => Completion::Returned(Err(TestError::runtime(format!(
                "test task did not complete: {join_error}"
            )))),
            Err(_) => {
                debug!(
                    case = case.name(),
                    timeout_ms = limit.as_millis() as u64,
                    "abandoning timed-out unit"
                );
                Completion::TimedOut(limit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_no_error_no_expectation() {
        let verdict = classify(None, Completion::Returned(Ok(())));
        assert_eq!(verdict, Verdict::Passed);
    }

    #[test]
    fn test_classify_missing_expected() {
        let verdict = classify(Some(ErrorKind::Runtime), Completion::Returned(Ok(())));
        assert_eq!(
            verdict,
            Verdict::MissingExpected {
                kind: ErrorKind::Runtime
            }
        );
    }

    #[test]
    fn test_classify_unexpected() {
        let error = TestError::logic("Unexpected exception type thrown");
        let verdict = classify(None, Completion::Returned(Err(error.clone())));
        assert_eq!(verdict, Verdict::Unexpected { error });
    }

    #[test]
    fn test_classify_expected_kind_absorbed() {
        let verdict = classify(
            Some(ErrorKind::Runtime),
            Completion::Returned(Err(TestError::runtime("Deliberate"))),
        );
        assert_eq!(
            verdict,
            Verdict::ExpectedRaised {
                kind: ErrorKind::Runtime
            }
        );
        assert_eq!(verdict.status(), UnitStatus::Pass);
    }

    #[test]
    fn test_classify_kind_mismatch() {
        let actual = TestError::logic("wrong kind");
        let verdict = classify(
            Some(ErrorKind::Runtime),
            Completion::Returned(Err(actual.clone())),
        );
        assert_eq!(
            verdict,
            Verdict::KindMismatch {
                expected: ErrorKind::Runtime,
                actual
            }
        );
    }

    #[test]
    fn test_classify_timeout_wins_over_expectation() {
        let verdict = classify(
            Some(ErrorKind::Runtime),
            Completion::TimedOut(Duration::from_millis(200)),
        );
        assert_eq!(verdict, Verdict::TimedOut { timeout_ms: 200 });
    }

    #[test]
    fn test_guard_catches_panics() {
        let outcome = guard(|| panic!("exploded"));
        let error = outcome.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Panic);
        assert_eq!(error.message(), "exploded");

        assert!(guard(|| Ok(())).is_ok());
    }

    #[test]
    fn test_timed_unit_runs_on_watchdog() {
        use crate::config::RunnerConfig;
        use crate::output::CaptureReporter;

        let capture = Arc::new(CaptureReporter::new());
        let runner = TestRunner::new(RunnerConfig::default())
            .unwrap()
            .with_reporter(capture.clone());
        let suite = Suite::new("Timed", ())
            .with_case(TestCase::new("quick", |_: &(), _: &TestContext| Ok(())).timeout_ms(1_000))
            .and_then(|s| {
                s.with_case(
                    TestCase::new("slow", |_: &(), _: &TestContext| {
                        std::thread::sleep(Duration::from_millis(300));
                        Ok(())
                    })
                    .timeout_ms(50),
                )
            })
            .unwrap();

        let quick = runner.run_unit(&suite, &suite.cases()[0], 1);
        assert_eq!(quick.verdict, Verdict::Passed);

        let slow = runner.run_unit(&suite, &suite.cases()[1], 1);
        assert_eq!(slow.verdict, Verdict::TimedOut { timeout_ms: 50 });
        assert!(capture.contains("Test case 'slow' timed out after 50 ms"));
    }

    #[test]
    fn test_failure_messages_are_distinct() {
        let unexpected = failure_message(
            "T",
            "T",
            &Verdict::Unexpected {
                error: TestError::logic("x"),
            },
        )
        .unwrap();
        let mismatch = failure_message(
            "T",
            "T",
            &Verdict::KindMismatch {
                expected: ErrorKind::Runtime,
                actual: TestError::logic("x"),
            },
        )
        .unwrap();

        assert!(unexpected.starts_with("Unexpected exception thrown in test 'T'"));
        assert!(mismatch.starts_with("Unexpected exception type thrown in test 'T'"));
        assert!(!mismatch.contains("Unexpected exception thrown"));
        assert!(failure_message("T", "T", &Verdict::Passed).is_none());
        assert_eq!(
            failure_message("T", "T (Repetition 2)", &Verdict::TimedOut { timeout_ms: 200 })
                .unwrap(),
            "Test case 'T (Repetition 2)' timed out after 200 ms"
        );
    }
}
