//! Speedup report output
//!
//! CSV files for plotting plus a plain-text table for the console.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which variable an experiment sweeps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Experiment {
    TestCount,
    Complexity,
}

impl Experiment {
    /// Name of the swept column
    pub fn level_header(&self) -> &'static str {
        match self {
            Experiment::TestCount => "NumTests",
            Experiment::Complexity => "ComplexityLevel",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Experiment::TestCount => "speedup_vs_number_of_tests.csv",
            Experiment::Complexity => "speedup_vs_complexity.csv",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Experiment::TestCount => "Speedup vs Number of Tests",
            Experiment::Complexity => "Speedup vs Complexity",
        }
    }
}

/// One measurement: both modes over the same registry, times in seconds
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpeedupPoint {
    pub level: u64,
    pub sequential_secs: f64,
    pub concurrent_secs: f64,
}

impl SpeedupPoint {
    pub fn speedup(&self) -> f64 {
        if self.concurrent_secs > 0.0 {
            self.sequential_secs / self.concurrent_secs
        } else {
            0.0
        }
    }
}

/// Results of one experiment
#[derive(Clone, Debug, Serialize)]
pub struct ExperimentReport {
    pub experiment: Experiment,
    pub points: Vec<SpeedupPoint>,
}

impl ExperimentReport {
    pub fn new(experiment: Experiment) -> Self {
        Self {
            experiment,
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, point: SpeedupPoint) {
        self.points.push(point);
    }

    /// Write `<dir>/<experiment file>`, returning the path written
    pub fn write_csv_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        let path = dir.join(self.experiment.file_name());
        self.write_csv(&path)?;
        Ok(path)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

        writer.write_record([
            self.experiment.level_header(),
            "SequentialTime",
            "ConcurrentTime",
            "Speedup",
        ])?;

        for point in &self.points {
            writer.write_record([
                point.level.to_string(),
                format!("{:.6}", point.sequential_secs),
                format!("{:.6}", point.concurrent_secs),
                format!("{:.4}", point.speedup()),
            ])?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        Ok(())
    }

    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{:=^64}\n", format!(" {} ", self.experiment.title())));
        output.push_str(&format!(
            "{:>16} {:>14} {:>14} {:>10}\n",
            self.experiment.level_header(),
            "Sequential(s)",
            "Concurrent(s)",
            "Speedup"
        ));
        output.push_str(&format!("{}\n", "-".repeat(64)));
        for point in &self.points {
            output.push_str(&format!(
                "{:>16} {:>14.4} {:>14.4} {:>9.2}x\n",
                point.level,
                point.sequential_secs,
                point.concurrent_secs,
                point.speedup()
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(experiment: Experiment) -> ExperimentReport {
        let mut report = ExperimentReport::new(experiment);
        report.push(SpeedupPoint {
            level: 100,
            sequential_secs: 2.0,
            concurrent_secs: 0.5,
        });
        report.push(SpeedupPoint {
            level: 500,
            sequential_secs: 1.0,
            concurrent_secs: 0.0,
        });
        report
    }

    #[test]
    fn test_speedup() {
        let report = sample(Experiment::TestCount);
        assert_eq!(report.points[0].speedup(), 4.0);
        assert_eq!(report.points[1].speedup(), 0.0);
    }

    #[test]
    fn test_write_csv_headers() {
        let dir = tempdir().unwrap();

        let path = sample(Experiment::TestCount).write_csv_in(dir.path()).unwrap();
        assert!(path.ends_with("speedup_vs_number_of_tests.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("NumTests,SequentialTime,ConcurrentTime,Speedup")
        );
        assert_eq!(lines.next(), Some("100,2.000000,0.500000,4.0000"));

        let path = sample(Experiment::Complexity)
            .write_csv_in(dir.path().join("nested"))
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("ComplexityLevel,SequentialTime,ConcurrentTime,Speedup\n"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_format_table() {
        let table = sample(Experiment::Complexity).format_table();
        assert!(table.contains("Speedup vs Complexity"));
        assert!(table.contains("4.00x"));
    }
}
