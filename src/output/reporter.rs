//! Reporting sinks
//!
//! Every line the runner or a test prints goes through a [`Reporter`].
//! Lines are written atomically, so concurrent workers never tear each
//! other's output, though ordering across workers is unspecified.

use parking_lot::Mutex;
use std::io::Write;

/// Line-oriented output sink shared by the runner and its workers
pub trait Reporter: Send + Sync {
    fn line(&self, line: &str);
}

/// Writes lines to stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout is not worth failing a test run over
        let _ = writeln!(out, "{line}");
    }
}

/// Buffers lines in memory for later inspection
#[derive(Debug, Default)]
pub struct CaptureReporter {
    lines: Mutex<Vec<String>>,
}

impl CaptureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// All captured lines joined with newlines
    pub fn output(&self) -> String {
        self.lines.lock().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    /// Number of lines containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|l| l.contains(needle)).count()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    /// Drain the buffer, returning what was captured
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl Reporter for CaptureReporter {
    fn line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn line(&self, _line: &str) {}
}
