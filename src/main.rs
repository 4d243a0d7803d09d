//! unitrun - fixture-based unit-testing harness
//!
//! Runs the built-in suites sequentially and on a worker pool and compares
//! the two.
//!
//! ## Usage
//!
//! ```bash
//! # Run the demo suites in both modes
//! unitrun demo
//!
//! # Concurrent only, JSON summary, 4 workers
//! unitrun --workers 4 demo --mode concurrent --format json
//!
//! # Verify the harness against its own internal suite
//! unitrun self-check
//!
//! # Speedup experiments, CSV written to ./results
//! unitrun bench --output-dir results --test-counts 100,500
//!
//! # List suites and cases
//! unitrun list --detailed
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod cli;

use cli::{Args, BenchArgs, Command, ConfigAction, DemoArgs, ListArgs};
use unitrun::benchmark::BenchmarkRunner;
use unitrun::config::env::print_env_help;
use unitrun::config::{AppConfig, ConcurrencyPolicy, EnvConfig};
use unitrun::models::DispatchMode;
use unitrun::output::{
    write_results_to_file, ConsoleReporter, NullReporter, OutputFormat, Reporter, ResultFormatter,
};
use unitrun::registry::Registry;
use unitrun::suites::{demo, internal};
use unitrun::utils::{init_logger, measure};
use unitrun::TestRunner;

fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();
    let config = resolve_config(&args, &env)?;

    init_logger(config.log_level.or_verbose(args.verbose));
    info!(
        workers = ?config.runner.workers,
        policy = %config.runner.policy,
        "configuration loaded"
    );

    match args.command {
        Command::Demo(demo_args) => {
            run_demo(demo_args, &config, &env)?;
        }
        Command::SelfCheck => {
            if !run_self_check(&config)? {
                std::process::exit(1);
            }
        }
        Command::Bench(bench_args) => {
            run_bench(bench_args, &config, args.verbose)?;
        }
        Command::List(list_args) => {
            list_suites(list_args)?;
        }
        Command::Config(config_args) => {
            manage_config(config_args.action, &config, &env)?;
        }
    }

    Ok(())
}

/// CLI flag > environment > config file > defaults
fn resolve_config(args: &Args, env: &EnvConfig) -> Result<AppConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));
    let mut config = AppConfig::load_or_default(path.as_deref())?;

    config.apply_env(env);
    if let Some(workers) = args.workers {
        config.runner.workers = Some(workers);
    }
    if let Some(policy) = &args.policy {
        config.runner.policy = ConcurrencyPolicy::from_str(policy)
            .ok_or_else(|| anyhow::anyhow!("Unknown concurrency policy: {policy}"))?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_modes(mode: &str) -> Result<Vec<DispatchMode>> {
    if mode.eq_ignore_ascii_case("both") {
        return Ok(vec![DispatchMode::Sequential, DispatchMode::Concurrent]);
    }
    DispatchMode::from_str(mode)
        .map(|m| vec![m])
        .ok_or_else(|| anyhow::anyhow!("Unknown mode: {mode}"))
}

fn print_speedup(sequential: Duration, concurrent: Duration) {
    let concurrent = concurrent.as_secs_f64();
    if concurrent > 0.0 {
        println!(
            "\nPerformance Improvement: {:.2}x faster when running concurrently.",
            sequential.as_secs_f64() / concurrent
        );
    }
}

fn run_demo(args: DemoArgs, config: &AppConfig, env: &EnvConfig) -> Result<()> {
    let modes = parse_modes(&args.mode)?;
    let format_name = args.format.unwrap_or_else(|| env.format_or("summary"));
    let format = OutputFormat::from_str(&format_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {format_name}"))?;
    let formatter = ResultFormatter::new(format);

    let registry = demo::registry(Arc::new(ConsoleReporter))?;
    let runner = TestRunner::new(config.runner.clone())?;
    info!(
        suites = registry.len(),
        units = registry.unit_count(),
        workers = runner.worker_count(),
        "starting demo run"
    );

    let several = modes.len() > 1;
    let mut timings = Vec::new();
    for mode in modes {
        println!("Running tests {}...", adverb(mode));
        let (summary, elapsed) = measure(|| match &args.suite {
            Some(filter) => runner.run_filtered(&registry, mode, filter),
            None => runner.run_mode(&registry, mode),
        });
        println!(
            "Total time for {mode} execution: {:.3} seconds\n",
            elapsed.as_secs_f64()
        );
        println!("{}", formatter.format_run(&summary));

        if let Some(path) = &args.output {
            let path = summary_path(path, mode, several);
            write_results_to_file(&path, &summary, format)?;
            info!("Summary written to {}", path.display());
        }
        timings.push(elapsed);
    }

    if let [sequential, concurrent] = timings[..] {
        print_speedup(sequential, concurrent);
    }

    Ok(())
}

/// With more than one mode, each summary gets its own `<stem>-<mode>.<ext>` file
fn summary_path(path: &Path, mode: DispatchMode, several: bool) -> PathBuf {
    if !several {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "summary".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{mode}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{mode}"),
    };
    path.with_file_name(name)
}

fn adverb(mode: DispatchMode) -> &'static str {
    match mode {
        DispatchMode::Sequential => "sequentially",
        DispatchMode::Concurrent => "concurrently",
    }
}

fn run_self_check(config: &AppConfig) -> Result<bool> {
    println!("Running internal tests ({}) in both modes...", internal::SUITE_NAME);
    let report = internal::self_check(&config.runner)?;

    println!(
        "Total time for sequential execution: {:.3} seconds",
        report.sequential_time.as_secs_f64()
    );
    println!(
        "Total time for concurrent execution: {:.3} seconds\n",
        report.concurrent_time.as_secs_f64()
    );

    for check in &report.checks {
        println!("{check}");
    }

    let passed = report.all_passed();
    if passed {
        println!("\n[OVERALL RESULT] All checks PASSED.");
    } else {
        println!("\n[OVERALL RESULT] Some checks FAILED.");
    }
    print_speedup(report.sequential_time, report.concurrent_time);

    Ok(passed)
}

fn run_bench(args: BenchArgs, config: &AppConfig, verbose: bool) -> Result<()> {
    let mut bench_config = config.benchmark.clone();
    if let Some(dir) = args.output_dir {
        bench_config.output_dir = dir;
    }
    if let Some(counts) = args.test_counts {
        bench_config.test_counts = counts;
    }
    if let Some(levels) = args.complexity {
        bench_config.complexity_levels = levels;
    }

    let reporter: Arc<dyn Reporter> = if args.show_output || verbose {
        Arc::new(ConsoleReporter)
    } else {
        Arc::new(NullReporter)
    };
    let bench = BenchmarkRunner::new(config.runner.clone())?.with_reporter(reporter);

    println!(
        "Benchmarking {} test-count and {} complexity levels...",
        bench_config.test_counts.len(),
        bench_config.complexity_levels.len()
    );
    let reports = bench
        .run_all(&bench_config)
        .context("Benchmark failed")?;

    for report in &reports {
        println!("{}", report.format_table());
        println!(
            "Results written to {}",
            bench_config
                .output_dir
                .join(report.experiment.file_name())
                .display()
        );
    }
    println!("\nAll performance experiments completed.");

    Ok(())
}

fn all_suites() -> Result<Registry> {
    let reporter: Arc<dyn Reporter> = Arc::new(NullReporter);
    let mut registry = demo::registry(Arc::clone(&reporter))?;
    registry.register(internal::suite(reporter)?)?;
    Ok(registry)
}

fn list_suites(args: ListArgs) -> Result<()> {
    let registry = all_suites()?;

    println!(
        "\nRegistered Test Suites ({} suites, {} units)\n",
        registry.len(),
        registry.unit_count()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for (suite, cases) in registry.describe() {
        println!("\n{suite} ({} cases):", cases.len());
        println!("──────────────────────────────────────────────────────────────────────");
        for (i, case) in cases.iter().enumerate() {
            if args.detailed {
                println!("  {:2}. {:36} {}", i + 1, case.name, case.flags());
            } else {
                println!("  {:2}. {}", i + 1, case.name);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}

fn manage_config(action: ConfigAction, config: &AppConfig, env: &EnvConfig) -> Result<()> {
    match action {
        ConfigAction::Show { format } => {
            let content = match format.to_lowercase().as_str() {
                "json" => serde_json::to_string_pretty(config)?,
                "yaml" | "yml" => serde_yaml::to_string(config)?,
                other => anyhow::bail!("Unknown config format: {other}"),
            };
            println!("{content}");
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            AppConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Env => {
            print_env_help();
            println!();
            if env.has_any() {
                env.print_summary();
            } else {
                println!("No UNITRUN_* variables are set.");
            }
        }
    }
    Ok(())
}
