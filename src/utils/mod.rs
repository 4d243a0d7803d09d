//! Utility functions and helpers

mod logger;
mod timer;

pub use logger::{filter_directive, init_logger, LogLevel};
pub use timer::{measure, Stopwatch, Timer};
