//! Benchmarking module
//!
//! Measures how much concurrent dispatch speeds up a run, sweeping either
//! the number of tests or their computational weight.

mod report;
mod runner;

pub use report::{Experiment, ExperimentReport, SpeedupPoint};
pub use runner::{workload_registry, BenchmarkRunner, WorkloadMix, WORKLOAD_SUITE};
