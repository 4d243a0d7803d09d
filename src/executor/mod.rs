//! Test execution engine
//!
//! Runs registered suites sequentially or across a worker pool, with an
//! optional per-unit timeout watchdog.

mod context;
mod parallel;
mod runner;
mod unit;

pub use context::TestContext;
pub use parallel::{available_workers, TaskQueue, WorkerPool, FALLBACK_WORKERS};
pub use runner::TestRunner;
