//! Benchmark report assembly and output formats

use crate::error::HarnessError;
use crate::scenario::Scenario;
use crate::stats::LatencyStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;
use todolist_core::format::format_micros;

/// Measurements of one successful scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    /// Tasks in the store when measurement began
    pub rows: usize,
    pub warmup: usize,
    pub iterations: usize,
    #[serde(flatten)]
    pub stats: LatencyStats,
}

/// A scenario that aborted
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub scenario: String,
    pub rows: usize,
    pub error: String,
}

/// Results of a whole harness run
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
    pub failures: Vec<FailureRecord>,
}

impl Default for BenchReport {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            scenarios: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record the outcome of one run.
    pub fn record(
        &mut self,
        scenario: Scenario,
        rows: usize,
        outcome: Result<ScenarioReport, HarnessError>,
    ) {
        match outcome {
            Ok(report) => self.scenarios.push(report),
            Err(err) => {
                tracing::error!(scenario = scenario.name(), rows, error = %err, "Scenario failed");
                self.failures.push(FailureRecord {
                    scenario: scenario.name().to_string(),
                    rows,
                    error: err.to_string(),
                });
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn write<W: Write>(&self, format: ReportFormat, mut out: W) -> io::Result<()> {
        match format {
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut out, self)?;
                writeln!(out)?;
            }
            ReportFormat::Jsonl => {
                for report in &self.scenarios {
                    serde_json::to_writer(&mut out, report)?;
                    writeln!(out)?;
                }
                for failure in &self.failures {
                    serde_json::to_writer(&mut out, failure)?;
                    writeln!(out)?;
                }
            }
            ReportFormat::Table => self.write_table(&mut out)?,
        }
        out.flush()
    }

    fn write_table<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{:<14} {:>8} {:>7} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "scenario", "rows", "iters", "mean", "p50", "p95", "p99", "ops/sec"
        )?;
        for r in &self.scenarios {
            writeln!(
                out,
                "{:<14} {:>8} {:>7} {:>10} {:>10} {:>10} {:>10} {:>12.0}",
                r.scenario,
                r.rows,
                r.iterations,
                format_micros(r.stats.mean_us),
                format_micros(r.stats.p50_us),
                format_micros(r.stats.p95_us),
                format_micros(r.stats.p99_us),
                r.stats.throughput,
            )?;
        }
        for f in &self.failures {
            writeln!(out, "FAILED {} (rows {}): {}", f.scenario, f.rows, f.error)?;
        }
        Ok(())
    }
}

/// How the report is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// One pretty-printed JSON document
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
    /// Aligned text for terminals
    Table,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ReportFormat::Json),
            "jsonl" => Ok(ReportFormat::Jsonl),
            "table" => Ok(ReportFormat::Table),
            _ => Err(format!(
                "unknown format `{}` (expected json, jsonl or table)",
                s
            )),
        }
    }
}
