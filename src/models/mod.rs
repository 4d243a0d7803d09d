//! Data models for the test harness
//!
//! Test case records, suites and fixtures, the error taxonomy, and the
//! result types the runner produces.

mod case;
mod error;
mod suite;
mod test_result;

pub use case::{CaseInfo, TestCase, TestFn};
pub use error::{ErrorKind, HarnessError, TestError, TestOutcome};
pub use suite::{Fixture, Suite, SuiteHandle};
pub use test_result::{
    DispatchMode, Hook, RunSummary, SuiteSummary, UnitKey, UnitResult, UnitStatus, Verdict,
};
