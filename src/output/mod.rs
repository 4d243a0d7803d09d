//! Output module
//!
//! Line reporters for live test output and formatters for run summaries.

mod formatter;
mod reporter;

pub use formatter::{write_results_to_file, OutputFormat, ResultFormatter};
pub use reporter::{CaptureReporter, ConsoleReporter, NullReporter, Reporter};
