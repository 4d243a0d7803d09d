//! Built-in suites
//!
//! The engine self-check, the demonstration suites, and the CPU-bound
//! workloads they share with the benchmark.

pub mod demo;
pub mod internal;
pub mod workload;
