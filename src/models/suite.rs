//! Fixtures and test suites
//!
//! A [`Suite`] binds one [`Fixture`] instance to an ordered list of cases.
//! The fixture is shared by every case, every repetition and, in concurrent
//! mode, every worker thread, so its hooks take `&self`.

use std::sync::Arc;

use super::case::{CaseInfo, TestCase};
use super::error::{HarnessError, TestOutcome};
use super::test_result::{DispatchMode, SuiteSummary};
use crate::executor::TestRunner;

/// Lifecycle hooks around a suite's cases. Every hook defaults to a no-op.
pub trait Fixture: Send + Sync + 'static {
    /// Called once before any case in the suite runs
    fn before_all(&self) -> TestOutcome {
        Ok(())
    }

    /// Called once after every case has finished, even failing ones
    fn after_all(&self) -> TestOutcome {
        Ok(())
    }

    /// Called before every repetition of every enabled case
    fn before_each(&self) -> TestOutcome {
        Ok(())
    }

    /// Called after every repetition, whatever its outcome
    fn after_each(&self) -> TestOutcome {
        Ok(())
    }
}

impl Fixture for () {}

/// Ordered collection of test cases sharing one fixture
pub struct Suite<F: Fixture> {
    name: String,
    fixture: Arc<F>,
    cases: Vec<TestCase<F>>,
}

impl<F: Fixture> Suite<F> {
    pub fn new(name: impl Into<String>, fixture: F) -> Self {
        Self {
            name: name.into(),
            fixture: Arc::new(fixture),
            cases: Vec::new(),
        }
    }

    /// Append a case; names must be unique within the suite
    pub fn add_case(&mut self, case: TestCase<F>) -> Result<&mut Self, HarnessError> {
        if self.cases.iter().any(|c| c.name() == case.name()) {
            return Err(HarnessError::DuplicateCase {
                suite: self.name.clone(),
                case: case.name().to_string(),
            });
        }
        self.cases.push(case);
        Ok(self)
    }

    /// Builder form of [`Suite::add_case`]
    pub fn with_case(mut self, case: TestCase<F>) -> Result<Self, HarnessError> {
        self.add_case(case)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixture(&self) -> &Arc<F> {
        &self.fixture
    }

    pub fn cases(&self) -> &[TestCase<F>] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Number of (case, repetition) units that will actually execute
    pub fn unit_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| !c.is_disabled())
            .map(|c| c.repetitions() as usize)
            .sum()
    }
}

impl<F: Fixture> std::fmt::Debug for Suite<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("cases", &self.cases)
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a suite, as stored in the registry
pub trait SuiteHandle: Send + Sync {
    fn name(&self) -> &str;

    fn describe(&self) -> Vec<CaseInfo>;

    fn unit_count(&self) -> usize;

    /// Drive this suite's lifecycle on the given runner
    fn execute(&self, runner: &TestRunner, mode: DispatchMode) -> SuiteSummary;
}

impl<F: Fixture> SuiteHandle for Suite<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> Vec<CaseInfo> {
        self.cases.iter().map(TestCase::info).collect()
    }

    fn unit_count(&self) -> usize {
        Suite::unit_count(self)
    }

    fn execute(&self, runner: &TestRunner, mode: DispatchMode) -> SuiteSummary {
        runner.run_suite(self, mode)
    }
}
