//! todolist-bench - measure the task store under synthetic workloads
//!
//! Usage:
//!   todolist-bench                                   # all scenarios, JSON to stdout
//!   todolist-bench --scenario list_all --sizes 1000,50000 --format table
//!   todolist-bench --iterations 5000 --output report.jsonl --format jsonl
//!
//! Progress goes to stderr. The process exits with status 1 if any scenario
//! failed; the report still lists every scenario that completed.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use todolist_bench::{plan, run_scenario, BenchReport, HarnessConfig, ReportFormat, Scenario};
use todolist_core::Config;

#[derive(Parser, Debug)]
#[command(name = "todolist-bench")]
#[command(about = "Benchmark the todolist task store")]
#[command(version)]
struct Args {
    /// Scenario to run (repeatable; default: all)
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<Scenario>,

    /// Measured iterations per CRUD scenario
    #[arg(long)]
    iterations: Option<usize>,

    /// Discarded iterations before measuring
    #[arg(long)]
    warmup: Option<usize>,

    /// Store sizes for list_all, comma separated
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<usize>>,

    /// Measured iterations per list_all size
    #[arg(long)]
    list_iterations: Option<usize>,

    /// Tasks seeded before lookup and update scenarios
    #[arg(long)]
    seed_rows: Option<usize>,

    /// Report format: json, jsonl or table
    #[arg(long, default_value = "json")]
    format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Don't show progress bars
    #[arg(long)]
    no_progress: bool,
}

impl Args {
    fn harness_config(&self) -> HarnessConfig {
        let defaults = HarnessConfig::default();
        HarnessConfig {
            warmup: self.warmup.unwrap_or(defaults.warmup),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            list_sizes: self.sizes.clone().unwrap_or(defaults.list_sizes),
            list_warmup: self.warmup.map_or(defaults.list_warmup, |w| w.min(defaults.list_warmup)),
            list_iterations: self.list_iterations.unwrap_or(defaults.list_iterations),
            seed_rows: self.seed_rows.unwrap_or(defaults.seed_rows),
        }
    }

    fn selected(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() {
            Scenario::ALL.to_vec()
        } else {
            self.scenarios.clone()
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        todolist_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let harness = args.harness_config();
    harness.validate()?;

    let runs = plan(&harness, &args.selected());
    tracing::info!(runs = runs.len(), ?harness, "Starting benchmark");

    let mut report = BenchReport::new();
    for (scenario, rows) in runs {
        let (warmup, iterations) = scenario.iterations(&harness);
        let pb = progress_bar(args.no_progress, (warmup + iterations) as u64)?;
        pb.set_message(format!("{} (rows {})", scenario, rows));

        let outcome = run_scenario(scenario, rows, &harness, |n| pb.inc(n as u64));
        pb.finish_and_clear();

        if let Err(err) = &outcome {
            eprintln!("error: {}", err);
        }
        report.record(scenario, rows, outcome);
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            report.write(args.format, BufWriter::new(file))?;
        }
        None => report.write(args.format, io::stdout().lock())?,
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} scenario(s) failed", report.failures.len());
        Ok(ExitCode::FAILURE)
    }
}

fn progress_bar(hidden: bool, len: u64) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
