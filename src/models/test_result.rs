//! Test result models
//!
//! Defines unit outcomes, their classification, and suite/run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::{ErrorKind, TestError};

/// How the runner dispatches a suite's units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    Sequential,
    Concurrent,
}

impl DispatchMode {
    pub fn from_concurrent(concurrent: bool) -> Self {
        if concurrent {
            DispatchMode::Concurrent
        } else {
            DispatchMode::Sequential
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Some(DispatchMode::Sequential),
            "concurrent" | "parallel" => Some(DispatchMode::Concurrent),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Sequential => write!(f, "sequential"),
            DispatchMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// Fixture hook points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::BeforeAll => write!(f, "before_all"),
            Hook::AfterAll => write!(f, "after_all"),
            Hook::BeforeEach => write!(f, "before_each"),
            Hook::AfterEach => write!(f, "after_each"),
        }
    }
}

/// Classification of one unit's execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Returned normally, nothing expected
    Passed,
    /// The expected error kind was raised and absorbed
    ExpectedRaised { kind: ErrorKind },
    MissingExpected { kind: ErrorKind },
    Unexpected { error: TestError },
    KindMismatch {
        expected: ErrorKind,
        actual: TestError,
    },
    TimedOut { timeout_ms: u64 },
    HookFailed { hook: Hook, error: TestError },
    Skipped,
}

impl Verdict {
    pub fn status(&self) -> UnitStatus {
        match self {
            Verdict::Passed | Verdict::ExpectedRaised { .. } => UnitStatus::Pass,
            Verdict::MissingExpected { .. }
            | Verdict::Unexpected { .. }
            | Verdict::KindMismatch { .. } => UnitStatus::Fail,
            Verdict::TimedOut { .. } => UnitStatus::Timeout,
            Verdict::HookFailed { .. } => UnitStatus::Error,
            Verdict::Skipped => UnitStatus::Skip,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::ExpectedRaised { kind } => write!(f, "raised expected {kind}"),
            Verdict::MissingExpected { kind } => write!(f, "expected {kind} was not thrown"),
            Verdict::Unexpected { error } => write!(f, "unexpected {error}"),
            Verdict::KindMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Verdict::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms} ms"),
            Verdict::HookFailed { hook, error } => write!(f, "{hook} failed: {error}"),
            Verdict::Skipped => write!(f, "disabled"),
        }
    }
}

/// Unit execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Pass,
    Fail,
    Timeout,
    Skip,
    Error,
}

impl UnitStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitStatus::Pass => "✓",
            UnitStatus::Fail => "✗",
            UnitStatus::Timeout => "⧖",
            UnitStatus::Skip => "○",
            UnitStatus::Error => "!",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Pass => write!(f, "PASS"),
            UnitStatus::Fail => write!(f, "FAIL"),
            UnitStatus::Timeout => write!(f, "TIMEOUT"),
            UnitStatus::Skip => write!(f, "SKIP"),
            UnitStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of one (case, repetition) unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitResult {
    pub suite: String,
    pub case: String,
    pub repetition: u32,
    pub status: UnitStatus,
    pub verdict: Verdict,
    pub assertion_failures: usize,
    pub duration_ms: u64,
    pub nondeterministic: bool,
}

impl UnitResult {
    pub fn new(
        suite: impl Into<String>,
        case: impl Into<String>,
        repetition: u32,
        verdict: Verdict,
    ) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            repetition,
            status: verdict.status(),
            verdict,
            assertion_failures: 0,
            duration_ms: 0,
            nondeterministic: false,
        }
    }

    pub fn skipped(suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self::new(suite, case, 0, Verdict::Skipped)
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_assertion_failures(mut self, failures: usize) -> Self {
        self.assertion_failures = failures;
        self
    }

    pub fn with_nondeterministic(mut self, nondeterministic: bool) -> Self {
        self.nondeterministic = nondeterministic;
        self
    }

    /// Passed classification and no failed assertions
    pub fn is_success(&self) -> bool {
        self.status == UnitStatus::Pass && self.assertion_failures == 0
    }
}

impl fmt::Display for UnitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.symbol(), self.case)?;
        if self.repetition > 0 {
            write!(f, " #{}", self.repetition)?;
        }
        write!(f, " [{}ms]", self.duration_ms)?;
        match self.verdict {
            Verdict::Passed => {}
            ref verdict => write!(f, " - {verdict}")?,
        }
        if self.assertion_failures > 0 {
            write!(f, " ({} assertion failure(s))", self.assertion_failures)?;
        }
        Ok(())
    }
}

/// Summary of one suite's execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub name: String,
    pub mode: DispatchMode,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
    pub errors: usize,
    pub assertion_failures: usize,
    pub duration_ms: u64,
    /// Suite-level hook fault (before_all / after_all)
    pub fatal: Option<String>,
    pub results: Vec<UnitResult>,
}

impl SuiteSummary {
    pub fn new(name: impl Into<String>, mode: DispatchMode, results: Vec<UnitResult>) -> Self {
        let count = |status: UnitStatus| results.iter().filter(|r| r.status == status).count();
        let passed = results.iter().filter(|r| r.is_success()).count();
        let failed = count(UnitStatus::Fail)
            + results
                .iter()
                .filter(|r| r.status == UnitStatus::Pass && r.assertion_failures > 0)
                .count();

        Self {
            name: name.into(),
            mode,
            total: results.len(),
            passed,
            failed,
            timed_out: count(UnitStatus::Timeout),
            skipped: count(UnitStatus::Skip),
            errors: count(UnitStatus::Error),
            assertion_failures: results.iter().map(|r| r.assertion_failures).sum(),
            duration_ms: 0,
            fatal: None,
            results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_fatal(mut self, fatal: Option<String>) -> Self {
        self.fatal = fatal;
        self
    }

    /// Units that ran (skipped ones excluded)
    pub fn executed(&self) -> usize {
        self.total - self.skipped
    }

    pub fn pass_rate(&self) -> f64 {
        let executed = self.executed();
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.fatal.is_none() && self.passed == self.executed()
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suite {} ({})", self.name, self.mode)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        if let Some(fatal) = &self.fatal {
            writeln!(f, "  ! {fatal}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Timeout: {} | Skip: {} | Error: {}",
            self.total, self.passed, self.failed, self.timed_out, self.skipped, self.errors
        )
    }
}

/// Key identifying a unit across runs
pub type UnitKey = (String, String, u32);

/// Summary of a full registry run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: DispatchMode,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub suites: Vec<SuiteSummary>,
}

impl RunSummary {
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            duration_ms: 0,
            suites: Vec::new(),
        }
    }

    pub fn push(&mut self, suite: SuiteSummary) {
        self.suites.push(suite);
    }

    pub fn total(&self) -> usize {
        self.suites.iter().map(|s| s.total).sum()
    }

    pub fn passed(&self) -> usize {
        self.suites.iter().map(|s| s.passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(|s| s.failed).sum()
    }

    pub fn timed_out(&self) -> usize {
        self.suites.iter().map(|s| s.timed_out).sum()
    }

    pub fn skipped(&self) -> usize {
        self.suites.iter().map(|s| s.skipped).sum()
    }

    pub fn errors(&self) -> usize {
        self.suites.iter().map(|s| s.errors).sum()
    }

    pub fn results(&self) -> impl Iterator<Item = &UnitResult> {
        self.suites.iter().flat_map(|s| s.results.iter())
    }

    /// Per-unit (status, succeeded) keyed by (suite, case, repetition).
    ///
    /// Independent of dispatch order, so sequential and concurrent runs of
    /// the same registry can be compared directly.
    pub fn outcomes(&self) -> BTreeMap<UnitKey, (UnitStatus, bool)> {
        self.results()
            .map(|r| {
                (
                    (r.suite.clone(), r.case.clone(), r.repetition),
                    (r.status, r.is_success()),
                )
            })
            .collect()
    }

    pub fn find(&self, suite: &str, case: &str) -> Vec<&UnitResult> {
        self.results()
            .filter(|r| r.suite == suite && r.case == case)
            .collect()
    }

    pub fn pass_rate(&self) -> f64 {
        let executed = self.total() - self.skipped();
        if executed == 0 {
            0.0
        } else {
            (self.passed() as f64 / executed as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.suites.iter().all(SuiteSummary::is_all_passed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suite in &self.suites {
            writeln!(f, "{suite}")?;
        }
        writeln!(
            f,
            "Run ({}) - Pass Rate: {:.1}% | Duration: {}ms",
            self.mode,
            self.pass_rate(),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_status() {
        assert_eq!(Verdict::Passed.status(), UnitStatus::Pass);
        assert_eq!(
            Verdict::ExpectedRaised {
                kind: ErrorKind::Runtime
            }
            .status(),
            UnitStatus::Pass
        );
        assert_eq!(
            Verdict::MissingExpected {
                kind: ErrorKind::Runtime
            }
            .status(),
            UnitStatus::Fail
        );
        assert_eq!(
            Verdict::TimedOut { timeout_ms: 200 }.status(),
            UnitStatus::Timeout
        );
        assert_eq!(Verdict::Skipped.status(), UnitStatus::Skip);
    }

    #[test]
    fn test_assertion_failures_break_success() {
        let result = UnitResult::new("S", "c", 1, Verdict::Passed);
        assert!(result.is_success());

        let result = result.with_assertion_failures(2);
        assert_eq!(result.status, UnitStatus::Pass);
        assert!(!result.is_success());
    }

    #[test]
    fn test_suite_summary_counts() {
        let results = vec![
            UnitResult::new("S", "pass", 1, Verdict::Passed),
            UnitResult::new("S", "asserts", 1, Verdict::Passed).with_assertion_failures(1),
            UnitResult::new(
                "S",
                "throws",
                1,
                Verdict::Unexpected {
                    error: TestError::logic("boom"),
                },
            ),
            UnitResult::new("S", "slow", 1, Verdict::TimedOut { timeout_ms: 200 }),
            UnitResult::skipped("S", "off"),
        ];

        let summary = SuiteSummary::new("S", DispatchMode::Sequential, results);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.executed(), 4);
        assert!(!summary.is_all_passed());
    }

    #[test]
    fn test_outcomes_keyed_by_unit() {
        let mut run = RunSummary::new(DispatchMode::Concurrent);
        run.push(SuiteSummary::new(
            "S",
            DispatchMode::Concurrent,
            vec![
                UnitResult::new("S", "rep", 2, Verdict::Passed),
                UnitResult::new("S", "rep", 1, Verdict::Passed),
            ],
        ));

        let keys: Vec<_> = run.outcomes().into_keys().collect();
        assert_eq!(
            keys,
            vec![
                ("S".to_string(), "rep".to_string(), 1),
                ("S".to_string(), "rep".to_string(), 2)
            ]
        );
        assert!(run.is_all_passed());
    }

    #[test]
    fn test_dispatch_mode_from_str() {
        assert_eq!(
            DispatchMode::from_str("Concurrent"),
            Some(DispatchMode::Concurrent)
        );
        assert_eq!(
            DispatchMode::from_str("seq"),
            Some(DispatchMode::Sequential)
        );
        assert_eq!(DispatchMode::from_str("both"), None);
    }
}
