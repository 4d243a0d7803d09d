//! Test execution runner
//!
//! Drives every registered suite through its fixture lifecycle, dispatching
//! units sequentially or across a per-suite worker pool.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{info, warn};

use super::parallel::{available_workers, WorkerPool};
use super::unit::guard;
use crate::config::{ConcurrencyPolicy, RunnerConfig};
use crate::models::{
    DispatchMode, Fixture, RunSummary, Suite, SuiteSummary, TestCase, UnitResult,
};
use crate::output::{ConsoleReporter, Reporter};
use crate::registry::Registry;
use crate::utils::Timer;

/// Test runner for registered suites
pub struct TestRunner {
    config: RunnerConfig,
    reporter: Arc<dyn Reporter>,
    handle: Handle,
    /// Owns the timeout watchdog threads; shut down without waiting on drop
    runtime: Option<Runtime>,
}

impl TestRunner {
    /// Create a runner that reports to stdout
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("unitrun-timeout")
            .enable_time()
            .build()
            .context("Failed to create timeout runtime")?;

        Ok(Self {
            config,
            reporter: Arc::new(ConsoleReporter),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Route all harness and test output to `reporter`
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub(crate) fn timer_handle(&self) -> &Handle {
        &self.handle
    }

    /// Worker pool size for concurrent dispatch
    pub fn worker_count(&self) -> usize {
        self.config
            .workers
            .filter(|n| *n > 0)
            .unwrap_or_else(available_workers)
    }

    /// Run every suite in registration order.
    ///
    /// `concurrent` selects the dispatch mode. Must not be called from inside
    /// an async context: timed units block on the runner's own runtime.
    pub fn run(&self, registry: &Registry, concurrent: bool) -> RunSummary {
        self.run_mode(registry, DispatchMode::from_concurrent(concurrent))
    }

    pub fn run_mode(&self, registry: &Registry, mode: DispatchMode) -> RunSummary {
        self.run_matching(registry, mode, |_| true)
    }

    /// Run only suites whose name contains `filter`
    pub fn run_filtered(&self, registry: &Registry, mode: DispatchMode, filter: &str) -> RunSummary {
        self.run_matching(registry, mode, |name| name.contains(filter))
    }

    fn run_matching(
        &self,
        registry: &Registry,
        mode: DispatchMode,
        select: impl Fn(&str) -> bool,
    ) -> RunSummary {
        info!(
            suites = registry.len(),
            units = registry.unit_count(),
            %mode,
            "starting test run"
        );

        let timer = Timer::start(format!("{mode} run"));
        let mut summary = RunSummary::new(mode);

        for suite in registry.suites().filter(|s| select(s.name())) {
            summary.push(suite.execute(self, mode));
        }

        summary.duration_ms = timer.stop().as_millis() as u64;

        info!(
            "Test run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.duration_ms,
            summary.passed(),
            summary.total() - summary.skipped(),
            summary.pass_rate()
        );

        summary
    }

    /// Drive one suite: `before_all`, dispatch, `after_all`
    pub(crate) fn run_suite<F: Fixture>(&self, suite: &Suite<F>, mode: DispatchMode) -> SuiteSummary {
        let timer = Timer::start(format!("suite {}", suite.name()));
        self.reporter
            .line(&format!("Running Test Suite: {}", suite.name()));
        let fixture = suite.fixture();

        if let Err(error) = guard(|| fixture.before_all()) {
            let fatal = format!(
                "Suite '{}' aborted: before_all failed: {error}",
                suite.name()
            );
            warn!("{fatal}");
            self.reporter.line(&fatal);
            self.reporter.line("");
            return SuiteSummary::new(suite.name(), mode, Vec::new())
                .with_fatal(Some(fatal))
                .with_duration(timer.elapsed_ms());
        }

        let results = match mode {
            DispatchMode::Sequential => {
                let cases: Vec<_> = suite.cases().iter().collect();
                self.dispatch_sequential(suite, &cases)
            }
            DispatchMode::Concurrent => self.dispatch_concurrent(suite),
        };

        let fatal = guard(|| fixture.after_all()).err().map(|error| {
            let fatal = format!("Suite '{}' after_all failed: {error}", suite.name());
            warn!("{fatal}");
            self.reporter.line(&fatal);
            fatal
        });

        let summary = SuiteSummary::new(suite.name(), mode, results)
            .with_fatal(fatal)
            .with_duration(timer.elapsed_ms());

        info!(
            "Suite {} completed: {}/{} passed ({:.1}%)",
            summary.name,
            summary.passed,
            summary.executed(),
            summary.pass_rate()
        );
        self.reporter.line("");

        summary
    }

    /// Cases in order, repetitions in order, all on the calling thread
    fn dispatch_sequential<F: Fixture>(
        &self,
        suite: &Suite<F>,
        cases: &[&TestCase<F>],
    ) -> Vec<UnitResult> {
        let mut results = Vec::new();

        for case in cases {
            if case.is_disabled() {
                results.push(self.skip(suite, case));
                continue;
            }
            for repetition in 1..=case.repetitions() {
                results.push(self.run_unit(suite, case, repetition));
            }
        }

        results
    }

    /// Every repetition of every pooled case becomes an independent unit
    fn dispatch_concurrent<F: Fixture>(&self, suite: &Suite<F>) -> Vec<UnitResult> {
        let eligible_only = self.config.policy == ConcurrencyPolicy::EligibleOnly;
        let mut results = Vec::new();
        let mut inline = Vec::new();
        let mut units = Vec::new();

        for case in suite.cases() {
            if case.is_disabled() {
                results.push(self.skip(suite, case));
            } else if eligible_only && !case.is_concurrent() {
                inline.push(case);
            } else {
                units.extend((1..=case.repetitions()).map(|repetition| (case, repetition)));
            }
        }

        results.extend(self.dispatch_sequential(suite, &inline));

        if !units.is_empty() {
            let pool = WorkerPool::new(self.worker_count());
            tracing::debug!(
                suite = suite.name(),
                units = units.len(),
                workers = pool.size(),
                "dispatching to worker pool"
            );
            results.extend(pool.run(units, |(case, repetition)| {
                self.run_unit(suite, case, repetition)
            }));
        }

        let order: HashMap<&str, usize> = suite
            .cases()
            .iter()
            .enumerate()
            .map(|(index, case)| (case.name(), index))
            .collect();
        results.sort_by_key(|r| (order.get(r.case.as_str()).copied(), r.repetition));

        results
    }

    fn skip<F: Fixture>(&self, suite: &Suite<F>, case: &TestCase<F>) -> UnitResult {
        self.reporter
            .line(&format!("Skipping Disabled Test Case: {}", case.name()));
        UnitResult::skipped(suite.name(), case.name())
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        // Abandoned timed-out tasks may still be running
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
