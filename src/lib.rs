//! unitrun - a small unit-testing harness
//!
//! Suites own a fixture with four lifecycle hooks and a list of test cases.
//! A case can be disabled, repeated, bounded by a timeout, marked as
//! expecting a particular error kind, or marked eligible for concurrent
//! dispatch. The [`TestRunner`] executes a [`Registry`] either in
//! registration order or across a worker pool, and prints a fixed set of
//! console lines describing what happened.
//!
//! ```no_run
//! use std::sync::Arc;
//! use unitrun::{check_eq, Fixture, Registry, Suite, TestCase, TestContext, TestRunner};
//! use unitrun::config::RunnerConfig;
//!
//! struct Math;
//! impl Fixture for Math {}
//!
//! let suite = Suite::new("Math", Math)
//!     .with_case(TestCase::new("adds", |_: &Math, ctx: &TestContext| {
//!         check_eq!(ctx, 4, 2 + 2);
//!         Ok(())
//!     }))?;
//! let registry = Registry::new().with_suite(suite)?;
//!
//! let runner = TestRunner::new(RunnerConfig::default())?;
//! let summary = runner.run(&registry, true);
//! assert!(summary.is_all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod benchmark;
pub mod config;
pub mod executor;
pub mod mock;
pub mod models;
pub mod output;
pub mod registry;
pub mod suites;
pub mod utils;

pub use executor::{TestContext, TestRunner};
pub use mock::{CallLog, MockMethod};
pub use models::{
    DispatchMode, ErrorKind, Fixture, HarnessError, RunSummary, Suite, TestCase, TestError,
    TestOutcome, UnitStatus, Verdict,
};
pub use output::{CaptureReporter, ConsoleReporter, Reporter};
pub use registry::Registry;
