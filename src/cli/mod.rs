//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Unit-testing harness with fixtures, timeouts and concurrent dispatch
#[derive(Parser, Debug)]
#[command(name = "unitrun")]
#[command(version = "0.1.0")]
#[command(about = "Run fixture-based test suites sequentially or on a worker pool")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Worker pool size for concurrent runs
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Concurrency policy (all-units, eligible-only)
    #[arg(short, long, global = true)]
    pub policy: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the demonstration suites
    Demo(DemoArgs),

    /// Run the harness's own internal suite and verify its output
    SelfCheck,

    /// Measure sequential vs concurrent speedup
    Bench(BenchArgs),

    /// List registered suites and cases
    List(ListArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for demo command
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Dispatch mode (sequential, concurrent, both)
    #[arg(short, long, default_value = "both")]
    pub mode: String,

    /// Summary format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Only run suites whose name contains this text
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Save the summary to a file (`<stem>-<mode>.<ext>` per mode when running both)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for bench command
#[derive(Parser, Debug)]
pub struct BenchArgs {
    /// Directory for the CSV results
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated numbers of light tests
    #[arg(short, long, value_delimiter = ',')]
    pub test_counts: Option<Vec<usize>>,

    /// Comma-separated complexity levels
    #[arg(long, value_delimiter = ',')]
    pub complexity: Option<Vec<u64>>,

    /// Show test output while benchmarking
    #[arg(long)]
    pub show_output: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show case flags (timeouts, repetitions, expected errors)
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write a default configuration file
    Init {
        /// Destination path (.yaml, .yml or .json)
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Describe environment overrides and their current values
    Env,
}
