//! Engine self-check
//!
//! A suite that exercises every outcome the engine can report, and the
//! textual checks that confirm the engine reported each one correctly.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::executor::{TestContext, TestRunner};
use crate::models::{
    DispatchMode, ErrorKind, Fixture, HarnessError, RunSummary, Suite, TestCase, TestError,
    TestOutcome,
};
use crate::output::{CaptureReporter, Reporter};
use crate::registry::Registry;
use crate::utils::measure;
use crate::{check, check_eq};

pub const SUITE_NAME: &str = "TestFrameworkInternalTests";

pub struct InternalFixture {
    reporter: Arc<dyn Reporter>,
}

impl InternalFixture {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    fn say(&self, message: &str) {
        self.reporter.line(&format!("[{SUITE_NAME}] {message}"));
    }
}

impl Fixture for InternalFixture {
    fn before_all(&self) -> TestOutcome {
        self.say("BeforeAll: Setting up.");
        Ok(())
    }

    fn after_all(&self) -> TestOutcome {
        self.say("AfterAll: Tearing down.");
        Ok(())
    }

    fn before_each(&self) -> TestOutcome {
        self.say("BeforeEach.");
        Ok(())
    }

    fn after_each(&self) -> TestOutcome {
        self.say("AfterEach.");
        Ok(())
    }
}

fn simple_pass(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestSimplePass: This should pass.");
    check!(ctx, 1 + 1 == 2);
    Ok(())
}

fn simple_fail(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestSimpleFail: This should fail.");
    check!(ctx, false);
    Ok(())
}

fn disabled_check(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestDisabledCheck: This should never run.");
    check!(ctx, false);
    Ok(())
}

fn expected_exception(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestExpectedException: Will raise runtime_error.");
    Err(TestError::runtime("Deliberate runtime_error"))
}

fn unexpected_exception(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestUnexpectedException: Will raise logic_error (not expected).");
    Err(TestError::logic("Unexpected exception type thrown"))
}

fn timeout_case(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("Running TestTimeoutCase: Will sleep longer than allowed.");
    thread::sleep(Duration::from_millis(500));
    check!(ctx, true);
    Ok(())
}

fn repeated_mixed(_: &InternalFixture, ctx: &TestContext) -> TestOutcome {
    let failing = ctx.repetition() == 2;
    ctx.log(format_args!(
        "Running TestRepeatedMixed (Repetition {}): {}",
        ctx.repetition(),
        if failing { "Failing" } else { "Passing" }
    ));
    check_eq!(ctx, failing, false);
    Ok(())
}

/// The self-check suite, printing through `reporter`
pub fn suite(reporter: Arc<dyn Reporter>) -> Result<Suite<InternalFixture>, HarnessError> {
    Suite::new(SUITE_NAME, InternalFixture::new(reporter))
        .with_case(TestCase::new("TestSimplePass", simple_pass))?
        .with_case(TestCase::new("TestSimpleFail", simple_fail))?
        .with_case(TestCase::new("TestDisabledCheck", disabled_check).disabled())?
        .with_case(
            TestCase::new("TestExpectedException", expected_exception)
                .expect_error(ErrorKind::Runtime),
        )?
        .with_case(TestCase::new("TestUnexpectedException", unexpected_exception))?
        .with_case(TestCase::new("TestTimeoutCase", timeout_case).timeout_ms(200))?
        .with_case(TestCase::new("TestRepeatedMixed", repeated_mixed).repeat(3))
}

pub fn registry(reporter: Arc<dyn Reporter>) -> Result<Registry, HarnessError> {
    Registry::new().with_suite(suite(reporter)?)
}

/// Outcome of one textual check
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "PASSED" } else { "FAILED" };
        write!(f, "[CHECK] {}: {verdict}", self.name)
    }
}

/// Check captured sequential-run output for the expected reporting of each case
pub fn verify(output: &str) -> Vec<CheckResult> {
    let has = |needle: &str| output.contains(needle);
    let check = |name, passed| CheckResult { name, passed };

    vec![
        check(
            "TestSimplePass",
            has("Running TestSimplePass") && !has("Assertion passed"),
        ),
        check(
            "TestSimpleFail",
            has("Running TestSimpleFail: This should fail.") && has("Assertion failed"),
        ),
        check(
            "TestDisabledCheck",
            has("Skipping Disabled Test Case: TestDisabledCheck")
                && !has("Running TestDisabledCheck"),
        ),
        check(
            "TestExpectedException",
            !has("Expected exception of type 'runtime_error' was not thrown")
                && !has("in test 'TestExpectedException'"),
        ),
        check(
            "TestUnexpectedException",
            has("Unexpected exception thrown in test 'TestUnexpectedException'"),
        ),
        check("TestTimeoutCase", has("timed out after")),
        check(
            "TestRepeatedMixed",
            has("Running Test Case: TestRepeatedMixed (Repetition 2)")
                && has("Running TestRepeatedMixed (Repetition 2): Failing"),
        ),
    ]
}

/// Everything observed by one self-check pass
#[derive(Debug)]
pub struct SelfCheckReport {
    pub checks: Vec<CheckResult>,
    pub sequential: RunSummary,
    pub concurrent: RunSummary,
    pub sequential_time: Duration,
    pub concurrent_time: Duration,
}

impl SelfCheckReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn speedup(&self) -> f64 {
        let concurrent = self.concurrent_time.as_secs_f64();
        if concurrent > 0.0 {
            self.sequential_time.as_secs_f64() / concurrent
        } else {
            0.0
        }
    }
}

/// Run the self-check suite in both modes and verify the sequential output.
///
/// The concurrent run must produce the same per-unit outcomes as the
/// sequential one; that comparison is reported as an extra check.
pub fn self_check(config: &RunnerConfig) -> Result<SelfCheckReport> {
    let capture = Arc::new(CaptureReporter::new());
    let registry = registry(capture.clone())?;
    let runner = TestRunner::new(config.clone())?.with_reporter(capture.clone());

    let (sequential, sequential_time) =
        measure(|| runner.run_mode(&registry, DispatchMode::Sequential));
    let sequential_output = capture.take().join("\n");

    let (concurrent, concurrent_time) =
        measure(|| runner.run_mode(&registry, DispatchMode::Concurrent));

    let mut checks = verify(&sequential_output);
    checks.push(CheckResult {
        name: "ConcurrentMatchesSequential",
        passed: sequential.outcomes() == concurrent.outcomes(),
    });

    tracing::info!(
        checks = checks.len(),
        failed = checks.iter().filter(|c| !c.passed).count(),
        "self-check finished"
    );

    Ok(SelfCheckReport {
        checks,
        sequential,
        concurrent,
        sequential_time,
        concurrent_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnitStatus, Verdict};

    #[test]
    fn test_suite_shape() {
        let suite = suite(Arc::new(CaptureReporter::new())).unwrap();
        assert_eq!(suite.len(), 7);
        // disabled case excluded, repeated case counted three times
        assert_eq!(suite.unit_count(), 8);
    }

    #[test]
    fn test_verify_detects_missing_lines() {
        let checks = verify("");
        let failed: Vec<_> = checks.iter().filter(|c| !c.passed).map(|c| c.name).collect();
        assert_eq!(
            failed,
            [
                "TestSimplePass",
                "TestSimpleFail",
                "TestDisabledCheck",
                "TestUnexpectedException",
                "TestTimeoutCase",
                "TestRepeatedMixed"
            ]
        );
    }

    #[test]
    fn test_verify_rejects_unexpected_expected_exception() {
        let output = "Expected exception of type 'runtime_error' was not thrown in test 'TestExpectedException'";
        let check = verify(output)
            .into_iter()
            .find(|c| c.name == "TestExpectedException")
            .unwrap();
        assert!(!check.passed);
        assert_eq!(check.to_string(), "[CHECK] TestExpectedException: FAILED");
    }

    #[test]
    fn test_end_to_end_self_check() {
        let report = self_check(&RunnerConfig::default()).unwrap();

        for check in &report.checks {
            assert!(check.passed, "{check}");
        }
        assert!(report.all_passed());

        let run = &report.sequential;
        assert_eq!(run.total(), 9);
        assert_eq!(run.skipped(), 1);
        assert_eq!(run.timed_out(), 1);
        assert!(run.find(SUITE_NAME, "TestSimplePass")[0].is_success());
        assert!(!run.find(SUITE_NAME, "TestSimpleFail")[0].is_success());
        assert!(run.find(SUITE_NAME, "TestExpectedException")[0].is_success());
        assert_eq!(
            run.find(SUITE_NAME, "TestUnexpectedException")[0].status,
            UnitStatus::Fail
        );

        let mixed: Vec<_> = run
            .find(SUITE_NAME, "TestRepeatedMixed")
            .iter()
            .map(|r| r.is_success())
            .collect();
        assert_eq!(mixed, [true, false, true]);

        assert_eq!(
            report.concurrent.find(SUITE_NAME, "TestTimeoutCase")[0].verdict,
            Verdict::TimedOut { timeout_ms: 200 }
        );
        assert!(report.speedup() > 0.0);
    }
}
