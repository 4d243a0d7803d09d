//! Sequential-vs-concurrent speedup experiments

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::report::{Experiment, ExperimentReport, SpeedupPoint};
use crate::config::{BenchmarkConfig, RunnerConfig};
use crate::executor::{TestContext, TestRunner};
use crate::models::{HarnessError, Suite, TestCase, TestOutcome};
use crate::output::{NullReporter, Reporter};
use crate::registry::Registry;
use crate::suites::workload::compute_large_prime;
use crate::utils::Stopwatch;
use crate::check;

pub const WORKLOAD_SUITE: &str = "WorkloadSuite";

/// Prime index used by the light cases, whatever the complexity
const LIGHT_PRIME_INDEX: u32 = 10;

/// Prime index used while sweeping the number of tests
const FIXED_COMPLEXITY: u32 = 1000;

/// How many cases of each weight a workload registry holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadMix {
    pub light: usize,
    pub moderate: usize,
    pub heavy: usize,
    /// Prime index computed by heavy cases; moderate ones use a tenth of it
    pub complexity: u32,
}

impl WorkloadMix {
    /// Mix for one point of the test-count sweep
    pub fn for_test_count(light: usize) -> Self {
        Self {
            light,
            moderate: 5,
            heavy: 3,
            complexity: FIXED_COMPLEXITY,
        }
    }

    /// Mix for one point of the complexity sweep
    pub fn for_complexity(complexity: u32) -> Self {
        Self {
            light: 100,
            moderate: 10,
            heavy: 5,
            complexity,
        }
    }

    pub fn total(&self) -> usize {
        self.light + self.moderate + self.heavy
    }
}

fn prime_case(name: String, index: u32) -> TestCase<()> {
    TestCase::new(name, move |_: &(), ctx: &TestContext| -> TestOutcome {
        check!(ctx, compute_large_prime(index) > 1);
        Ok(())
    })
}

/// A single-suite registry of prime-count cases
pub fn workload_registry(mix: WorkloadMix) -> Result<Registry, HarnessError> {
    let moderate_index = (mix.complexity / 10).max(1);
    let mut suite = Suite::new(WORKLOAD_SUITE, ());

    for i in 0..mix.light {
        suite.add_case(prime_case(format!("Light{i}"), LIGHT_PRIME_INDEX))?;
    }
    for i in 0..mix.moderate {
        suite.add_case(prime_case(format!("Moderate{i}"), moderate_index))?;
    }
    for i in 0..mix.heavy {
        suite.add_case(prime_case(format!("Heavy{i}"), mix.complexity))?;
    }

    Registry::new().with_suite(suite)
}

pub struct BenchmarkRunner {
    runner: TestRunner,
}

impl BenchmarkRunner {
    /// Runner with test output discarded
    pub fn new(config: RunnerConfig) -> Result<Self> {
        Ok(Self {
            runner: TestRunner::new(config)?.with_reporter(Arc::new(NullReporter)),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.runner = self.runner.with_reporter(reporter);
        self
    }

    /// Time one sequential run and one concurrent run of `registry`
    pub fn measure(&self, level: u64, registry: &Registry) -> SpeedupPoint {
        let mut stopwatch = Stopwatch::new();
        self.runner.run(registry, false);
        let sequential = stopwatch.lap("sequential");
        self.runner.run(registry, true);
        let concurrent = stopwatch.lap("concurrent");

        let point = SpeedupPoint {
            level,
            sequential_secs: sequential.as_secs_f64(),
            concurrent_secs: concurrent.as_secs_f64(),
        };
        info!(
            level,
            units = registry.unit_count(),
            speedup = point.speedup(),
            "measured workload"
        );
        point
    }

    pub fn speedup_vs_test_count(&self, counts: &[usize]) -> Result<ExperimentReport> {
        let mut report = ExperimentReport::new(Experiment::TestCount);
        for &count in counts {
            let registry = workload_registry(WorkloadMix::for_test_count(count))?;
            report.push(self.measure(count as u64, &registry));
        }
        Ok(report)
    }

    pub fn speedup_vs_complexity(&self, levels: &[u64]) -> Result<ExperimentReport> {
        let mut report = ExperimentReport::new(Experiment::Complexity);
        for &level in levels {
            let complexity = u32::try_from(level)?;
            let registry = workload_registry(WorkloadMix::for_complexity(complexity))?;
            report.push(self.measure(level, &registry));
        }
        Ok(report)
    }

    /// Run both experiments and write their CSV files to the configured directory
    pub fn run_all(&self, config: &BenchmarkConfig) -> Result<Vec<ExperimentReport>> {
        let reports = vec![
            self.speedup_vs_test_count(&config.test_counts)?,
            self.speedup_vs_complexity(&config.complexity_levels)?,
        ];
        for report in &reports {
            let path = report.write_csv_in(&config.output_dir)?;
            info!("Results written to {}", path.display());
        }
        Ok(reports)
    }
}
