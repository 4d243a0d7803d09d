//! Demonstration suites
//!
//! `HeavyComputationTestSuite` shows every case flag plus mocking;
//! `ArrayTestSuite` shows a large shared fixture that concurrent cases
//! must coordinate around.

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::workload::compute_large_prime;
use crate::executor::TestContext;
use crate::mock::{CallLog, MockMethod};
use crate::models::{ErrorKind, Fixture, HarnessError, Suite, TestCase, TestError, TestOutcome};
use crate::output::Reporter;
use crate::registry::Registry;
use crate::{check, check_eq};

pub const HEAVY_SUITE: &str = "HeavyComputationTestSuite";
pub const ARRAY_SUITE: &str = "ArrayTestSuite";

const PRIME_INDEX: u32 = 5000;
const ARRAY_LEN: i64 = 1_000_000;

pub struct HeavyComputationFixture {
    reporter: Arc<dyn Reporter>,
    shared_counter: Mutex<u32>,
}

impl HeavyComputationFixture {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter,
            shared_counter: Mutex::new(0),
        }
    }

    pub fn counter(&self) -> u32 {
        *self.shared_counter.lock()
    }
}

impl Fixture for HeavyComputationFixture {
    fn before_all(&self) -> TestOutcome {
        self.reporter
            .line("Executing BeforeAll: Setting up resources.");
        Ok(())
    }

    fn after_all(&self) -> TestOutcome {
        self.reporter
            .line("Executing AfterAll: Cleaning up resources.");
        Ok(())
    }
}

/// Calculator interface the mock stands in for
pub trait AdvancedCalculator {
    fn add3(&self, a: i32, b: i32, c: i32) -> i32 {
        a + b + c
    }

    fn concat_strings(&self, s1: &str, s2: &str, s3: &str) -> String {
        format!("{s1}{s2}{s3}")
    }

    fn multiply_many(&self, a: f64, b: f64, c: f64, d: f64) -> f64 {
        a * b * c * d
    }

    fn no_args_method(&self) {}
}

pub struct MockAdvancedCalculator {
    pub log: Arc<CallLog>,
    pub add3: MockMethod<(i32, i32, i32), i32>,
    pub concat_strings: MockMethod<(String, String, String), String>,
    pub multiply_many: MockMethod<(f64, f64, f64, f64), f64>,
    pub no_args_method: MockMethod<(), ()>,
}

impl MockAdvancedCalculator {
    pub fn new() -> Self {
        let log = Arc::new(CallLog::new());
        Self {
            add3: MockMethod::new("add3", Arc::clone(&log)),
            concat_strings: MockMethod::new("concatStrings", Arc::clone(&log)),
            multiply_many: MockMethod::new("multiplyMany", Arc::clone(&log)),
            no_args_method: MockMethod::new("noArgsMethod", Arc::clone(&log)),
            log,
        }
    }
}

impl Default for MockAdvancedCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvancedCalculator for MockAdvancedCalculator {
    fn add3(&self, a: i32, b: i32, c: i32) -> i32 {
        self.add3.call((a, b, c))
    }

    fn concat_strings(&self, s1: &str, s2: &str, s3: &str) -> String {
        self.concat_strings
            .call((s1.to_string(), s2.to_string(), s3.to_string()))
    }

    fn multiply_many(&self, a: f64, b: f64, c: f64, d: f64) -> f64 {
        self.multiply_many.call((a, b, c, d))
    }

    fn no_args_method(&self) {
        self.no_args_method.call(())
    }
}

fn compute_prime(label: &'static str) -> impl Fn(&HeavyComputationFixture, &TestContext) -> TestOutcome {
    move |_, ctx| {
        ctx.log(format_args!("In {label}"));
        let prime = compute_large_prime(PRIME_INDEX);
        check!(ctx, prime > 0);
        Ok(())
    }
}

fn disabled(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("This test should not run.");
    check!(ctx, false);
    Ok(())
}

fn expect_exception(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestExpectException");
    Err(TestError::runtime("Expected exception"))
}

fn timeout(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestTimeout");
    thread::sleep(Duration::from_millis(1000));
    check!(ctx, true);
    Ok(())
}

fn nondeterministic(fixture: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    let delay = rand::rng().random_range(100..=300);
    thread::sleep(Duration::from_millis(delay));

    let counter = {
        let mut counter = fixture.shared_counter.lock();
        *counter += 1;
        *counter
    };

    ctx.log(format_args!(
        "Repetition {}: Slept for {delay} ms, Counter = {counter}",
        ctx.repetition()
    ));
    check!(ctx, counter > 0);
    Ok(())
}

fn repeated(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log(format_args!("In TestRepeated, Repetition {}", ctx.repetition()));
    thread::sleep(Duration::from_millis(100));
    check!(ctx, true);
    Ok(())
}

fn mocking_add3(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestAdvancedMockingAdd3");
    let calc = MockAdvancedCalculator::new();
    calc.add3.returns(|(a, b, c)| a + b + c + 10);

    let result = calc.add3(1, 2, 3);
    check!(ctx, calc.log.verify_call("add3", &["1", "2", "3"]));
    check_eq!(ctx, 16, result);
    Ok(())
}

fn mocking_concat(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestAdvancedMockingConcatStrings");
    let calc = MockAdvancedCalculator::new();
    calc.concat_strings
        .returns(|(s1, s2, s3)| format!("{s1}-{s2}-{s3}"));

    let result = calc.concat_strings("Hello", "Mock", "World");
    check!(
        ctx,
        calc.log
            .verify_call("concatStrings", &["Hello", "Mock", "World"])
    );
    check_eq!(ctx, "Hello-Mock-World", result);
    Ok(())
}

fn mocking_multiply(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestAdvancedMockingMultiplyMany");
    let calc = MockAdvancedCalculator::new();
    calc.multiply_many
        .returns(|(a, b, c, d)| a * b * c * d + 5.0);

    let result = calc.multiply_many(2.0, 3.0, 4.0, 5.0);
    check!(
        ctx,
        calc.log.verify_call("multiplyMany", &["2", "3", "4", "5"])
    );
    check_eq!(ctx, 125.0, result);
    Ok(())
}

fn mocking_no_args(_: &HeavyComputationFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestAdvancedMockingNoArgsMethod");
    let calc = MockAdvancedCalculator::new();
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    calc.no_args_method
        .returns(move |_| flag.store(true, Ordering::SeqCst));

    calc.no_args_method();
    check!(ctx, calc.log.verify_call("noArgsMethod", &[]));
    check!(ctx, called.load(Ordering::SeqCst));
    Ok(())
}

pub fn heavy_computation_suite(
    reporter: Arc<dyn Reporter>,
) -> Result<Suite<HeavyComputationFixture>, HarnessError> {
    Suite::new(HEAVY_SUITE, HeavyComputationFixture::new(reporter))
        .with_case(TestCase::new("TestComputePrime1", compute_prime("TestComputePrime1")).concurrent())?
        .with_case(TestCase::new("TestComputePrime2", compute_prime("TestComputePrime2")).concurrent())?
        .with_case(TestCase::new(
            "TestComputePrimeSequential",
            compute_prime("TestComputePrimeSequential"),
        ))?
        .with_case(TestCase::new("TestDisabled", disabled).disabled())?
        .with_case(
            TestCase::new("TestExpectException", expect_exception).expect_error(ErrorKind::Runtime),
        )?
        .with_case(TestCase::new("TestTimeout", timeout).timeout_ms(500))?
        .with_case(
            TestCase::new("TestNondeterministic", nondeterministic)
                .repeat(5)
                .nondeterministic(),
        )?
        .with_case(TestCase::new("TestRepeated", repeated).repeat(3))?
        .with_case(TestCase::new("TestAdvancedMockingAdd3", mocking_add3))?
        .with_case(TestCase::new("TestAdvancedMockingConcatStrings", mocking_concat))?
        .with_case(TestCase::new("TestAdvancedMockingMultiplyMany", mocking_multiply))?
        .with_case(TestCase::new("TestAdvancedMockingNoArgsMethod", mocking_no_args))
}

/// Fixture holding `1..=1_000_000`.
///
/// Cases that mutate the array hold the write lock from mutation through
/// restore, so concurrent readers only ever see the pristine contents.
pub struct ArrayFixture {
    reporter: Arc<dyn Reporter>,
    large_array: RwLock<Vec<i64>>,
}

impl ArrayFixture {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter,
            large_array: RwLock::new(Vec::new()),
        }
    }

    fn pristine() -> Vec<i64> {
        (1..=ARRAY_LEN).collect()
    }

    fn expected_sum(len: usize) -> i64 {
        let n = len as i64;
        n * (n + 1) / 2
    }
}

impl Fixture for ArrayFixture {
    fn before_all(&self) -> TestOutcome {
        self.reporter
            .line("Executing BeforeAll: Setting up large array (once).");
        *self.large_array.write() = Self::pristine();
        Ok(())
    }

    fn before_each(&self) -> TestOutcome {
        let mut array = self.large_array.write();
        if array.len() != ARRAY_LEN as usize || array.first() != Some(&1) {
            *array = Self::pristine();
        }
        Ok(())
    }
}

fn array_sum(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArraySum");
    let array = fixture.large_array.read();
    let actual: i64 = array.iter().sum();
    check_eq!(ctx, ArrayFixture::expected_sum(array.len()), actual);
    Ok(())
}

fn array_sorted(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArraySorted");
    let array = fixture.large_array.read();
    check!(ctx, array.windows(2).all(|w| w[0] <= w[1]));
    Ok(())
}

fn array_reverse(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArrayReverse");
    let mut array = fixture.large_array.write();
    array.reverse();
    check_eq!(ctx, Some(&1), array.last());
    array.reverse();
    Ok(())
}

fn array_binary_search(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArrayBinarySearch");
    let array = fixture.large_array.read();
    check!(ctx, array.binary_search(&500_000).is_ok());
    Ok(())
}

fn array_modify(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArrayModify");
    let mut array = fixture.large_array.write();
    if array.len() < 100 {
        return Err(TestError::out_of_range(format!(
            "array has {} elements, need 100",
            array.len()
        )));
    }

    for value in array.iter_mut().take(100) {
        *value *= 2;
    }
    let doubled = array
        .iter()
        .take(100)
        .zip(1..)
        .all(|(value, i): (&i64, i64)| *value == i * 2);
    check!(ctx, doubled);

    for value in array.iter_mut().take(100) {
        *value /= 2;
    }
    Ok(())
}

fn array_performance(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    ctx.log("In TestArrayPerformance");
    let array = fixture.large_array.read();
    let start = Instant::now();
    let sum: i64 = array.iter().sum();
    ctx.log(format_args!(
        "Time to sum array: {:.6} seconds (sum = {sum})",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}

fn array_multi_thread_sum(fixture: &ArrayFixture, ctx: &TestContext) -> TestOutcome {
    const THREADS: usize = 4;
    ctx.log("In TestArrayMultiThreadSum");
    let array = fixture.large_array.read();
    let chunk = array.len().div_ceil(THREADS).max(1);

    let total: i64 = thread::scope(|scope| {
        let handles: Vec<_> = array
            .chunks(chunk)
            .map(|part| scope.spawn(move || part.iter().sum::<i64>()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(TestError::from_panic))
            .sum::<Result<i64, TestError>>()
    })?;

    check_eq!(ctx, ArrayFixture::expected_sum(array.len()), total);
    Ok(())
}

pub fn array_suite(reporter: Arc<dyn Reporter>) -> Result<Suite<ArrayFixture>, HarnessError> {
    Suite::new(ARRAY_SUITE, ArrayFixture::new(reporter))
        .with_case(TestCase::new("TestArraySum", array_sum))?
        .with_case(TestCase::new("TestArraySorted", array_sorted))?
        .with_case(TestCase::new("TestArrayReverse", array_reverse))?
        .with_case(TestCase::new("TestArrayBinarySearch", array_binary_search))?
        .with_case(TestCase::new("TestArrayModify", array_modify))?
        .with_case(TestCase::new("TestArrayPerformance", array_performance))?
        .with_case(TestCase::new("TestArrayMultiThreadSum", array_multi_thread_sum))
}

/// Both demo suites, heavy computation first
pub fn registry(reporter: Arc<dyn Reporter>) -> Result<Registry, HarnessError> {
    Registry::new()
        .with_suite(heavy_computation_suite(Arc::clone(&reporter))?)?
        .with_suite(array_suite(reporter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executor::TestRunner;
    use crate::models::{UnitStatus, Verdict};
    use crate::output::CaptureReporter;

    #[test]
    fn test_mock_calculator_defaults_and_records() {
        let calc = MockAdvancedCalculator::new();
        assert_eq!(calc.add3(1, 2, 3), 0);
        assert_eq!(calc.concat_strings("a", "b", "c"), "");
        calc.no_args_method();

        assert!(calc.log.verify_call("add3", &["1", "2", "3"]));
        assert!(calc.log.verify_call("concatStrings", &["a", "b", "c"]));
        assert!(calc.log.verify_call("noArgsMethod", &[]));
        assert_eq!(calc.log.calls().len(), 3);
    }

    #[test]
    fn test_real_calculator_defaults() {
        struct Real;
        impl AdvancedCalculator for Real {}

        assert_eq!(Real.add3(1, 2, 3), 6);
        assert_eq!(Real.concat_strings("a", "b", "c"), "abc");
        assert_eq!(Real.multiply_many(2.0, 3.0, 4.0, 5.0), 120.0);
    }

    #[test]
    fn test_registry_layout() {
        let registry = registry(Arc::new(CaptureReporter::new())).unwrap();
        assert_eq!(registry.names(), [HEAVY_SUITE, ARRAY_SUITE]);
        assert_eq!(registry.get(HEAVY_SUITE).unwrap().describe().len(), 12);
        assert_eq!(registry.get(ARRAY_SUITE).unwrap().describe().len(), 7);
    }

    #[test]
    fn test_array_suite_passes_in_both_modes() {
        let capture = Arc::new(CaptureReporter::new());
        let registry = Registry::new()
            .with_suite(array_suite(capture.clone()).unwrap())
            .unwrap();
        let runner = TestRunner::new(RunnerConfig::default())
            .unwrap()
            .with_reporter(capture.clone());

        for concurrent in [false, true] {
            let summary = runner.run(&registry, concurrent);
            assert!(summary.is_all_passed(), "{summary}");
            assert_eq!(summary.passed(), 7);
        }
        assert_eq!(
            capture.count("Executing BeforeAll: Setting up large array (once)."),
            2
        );
        assert_eq!(capture.count("Time to sum array:"), 2);
    }

    #[test]
    fn test_heavy_suite_outcomes() {
        let capture = Arc::new(CaptureReporter::new());
        let suite = heavy_computation_suite(capture.clone()).unwrap();
        let fixture = Arc::clone(suite.fixture());
        let registry = Registry::new().with_suite(suite).unwrap();
        let runner = TestRunner::new(RunnerConfig::default())
            .unwrap()
            .with_reporter(capture.clone());

        let summary = runner.run(&registry, true);

        assert_eq!(summary.total(), 18);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.timed_out(), 1);
        assert_eq!(summary.passed(), 16);
        assert_eq!(
            summary.find(HEAVY_SUITE, "TestTimeout")[0].verdict,
            Verdict::TimedOut { timeout_ms: 500 }
        );
        assert!(summary
            .find(HEAVY_SUITE, "TestNondeterministic")
            .iter()
            .all(|r| r.nondeterministic && r.status == UnitStatus::Pass));
        assert_eq!(fixture.counter(), 5);
        assert!(!capture.contains("This test should not run."));
        assert!(capture.contains("Executing AfterAll: Cleaning up resources."));
    }
}
