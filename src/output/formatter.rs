//! Output formatters for run summaries
//!
//! Renders a [`RunSummary`] after the console contract lines have been
//! printed: a boxed table, JSON, CSV, or a one-line brief.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::{RunSummary, SuiteSummary, UnitResult, UnitStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn format_run(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_run_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_run_csv(summary),
            OutputFormat::Summary => self.format_run_brief(summary),
        }
    }

    fn status_label(&self, status: UnitStatus) -> String {
        let plain = format!("{} {status}", status.symbol());
        if !self.colorize {
            return plain;
        }
        let color = match status {
            UnitStatus::Pass => "32",
            UnitStatus::Fail | UnitStatus::Error => "31",
            UnitStatus::Timeout | UnitStatus::Skip => "33",
        };
        format!("\x1b[{color}m{plain}\x1b[0m")
    }

    fn format_unit_row(&self, result: &UnitResult) -> String {
        let repetition = if result.repetition > 0 {
            format!("#{}", result.repetition)
        } else {
            "-".to_string()
        };
        let mut row = format!(
            "  {:32} {:>4} {} [{:>6}ms]",
            result.case,
            repetition,
            self.status_label(result.status),
            result.duration_ms
        );
        if result.assertion_failures > 0 {
            row.push_str(&format!(" ({} assertion failure(s))", result.assertion_failures));
        }
        if result.nondeterministic {
            row.push_str(" ~");
        }
        row
    }

    fn format_suite_table(&self, suite: &SuiteSummary) -> String {
        let mut output = String::new();

        output.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  {:58}  ║\n", format!("{} ({})", suite.name, suite.mode)));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for result in &suite.results {
            output.push_str(&self.format_unit_row(result));
            output.push('\n');
        }
        if let Some(fatal) = &suite.fatal {
            output.push_str(&format!("  ! {fatal}\n"));
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!(
            "  Total: {} | Pass: {} | Fail: {} | Timeout: {} | Skip: {} | Error: {}\n",
            suite.total, suite.passed, suite.failed, suite.timed_out, suite.skipped, suite.errors
        ));
        output.push_str(&format!(
            "  Pass Rate: {:5.1}% | Duration: {}ms\n",
            suite.pass_rate(),
            suite.duration_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_run_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        for suite in &summary.suites {
            output.push_str(&self.format_suite_table(suite));
        }
        output.push_str(&format!("{}\n", self.format_run_brief(summary)));
        output
    }

    fn format_run_csv(&self, summary: &RunSummary) -> String {
        run_csv(summary).unwrap_or_default()
    }

    fn format_run_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{} run: {}/{} passed ({:.1}%), {} failed, {} timed out, {} skipped, {} errors in {}ms",
            summary.mode,
            summary.passed(),
            summary.total() - summary.skipped(),
            summary.pass_rate(),
            summary.failed(),
            summary.timed_out(),
            summary.skipped(),
            summary.errors(),
            summary.duration_ms
        )
    }
}

fn run_csv(summary: &RunSummary) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "suite",
        "case",
        "repetition",
        "status",
        "assertion_failures",
        "duration_ms",
        "detail",
    ])?;
    for result in summary.results() {
        writer.write_record([
            result.suite.clone(),
            result.case.clone(),
            result.repetition.to_string(),
            result.status.to_string(),
            result.assertion_failures.to_string(),
            result.duration_ms.to_string(),
            result.verdict.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV output")?;
    Ok(String::from_utf8(bytes)?)
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write a run summary to a file, uncolored
pub fn write_results_to_file(
    path: impl AsRef<Path>,
    summary: &RunSummary,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let content = ResultFormatter::new(format).no_color().format_run(summary);
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchMode, TestError, Verdict};

    fn sample() -> RunSummary {
        let results = vec![
            UnitResult::new("Demo", "passes", 1, Verdict::Passed).with_duration(3),
            UnitResult::new(
                "Demo",
                "throws",
                1,
                Verdict::Unexpected {
                    error: TestError::logic("boom, \"quoted\""),
                },
            ),
            UnitResult::skipped("Demo", "off"),
        ];
        let mut run = RunSummary::new(DispatchMode::Sequential);
        run.push(SuiteSummary::new("Demo", DispatchMode::Sequential, results));
        run
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = ResultFormatter::new(OutputFormat::Json).no_color();
        assert_eq!(formatter.format(), OutputFormat::Json);
        assert!(!formatter.colorize);
    }

    #[test]
    fn test_table_output() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_run(&sample());
        assert!(output.contains("Demo (sequential)"));
        assert!(output.contains("✓ PASS"));
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("Total: 3 | Pass: 1 | Fail: 1"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_json_output_parses() {
        let output = ResultFormatter::new(OutputFormat::Json).format_run(&sample());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["suites"][0]["results"][1]["verdict"]["verdict"], "unexpected");
        assert_eq!(value["mode"], "sequential");
    }

    #[test]
    fn test_csv_output_quotes_details() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_run(&sample());
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("suite,case,repetition,status,assertion_failures,duration_ms,detail")
        );
        assert!(output.contains("\"unexpected logic_error: boom, \"\"quoted\"\"\""));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_brief_output() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_run(&sample());
        assert!(output.starts_with("sequential run: 1/2 passed (50.0%)"));
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_results_to_file(&path, &sample(), OutputFormat::JsonPretty).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"suites\""));
    }
}
