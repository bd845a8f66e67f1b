//! Benchmark harness for the todolist task store
//!
//! Every scenario runs against its own [`ScratchStore`], a file-backed
//! repository in a temporary directory, so measurements never touch the
//! user's task list.
//!
//! ```no_run
//! use todolist_bench::{run_scenario, HarnessConfig, Scenario};
//!
//! let config = HarnessConfig::default();
//! let report = run_scenario(Scenario::LookupById, config.seed_rows, &config, |_| {})?;
//! println!("p99: {:.1}µs", report.stats.p99_us);
//! # Ok::<(), todolist_bench::HarnessError>(())
//! ```

pub mod error;
pub mod report;
pub mod scenario;
pub mod scratch;
pub mod stats;

pub use error::{HarnessError, Phase};
pub use report::{BenchReport, FailureRecord, ReportFormat, ScenarioReport};
pub use scenario::{plan, run_scenario, HarnessConfig, Scenario};
pub use scratch::ScratchStore;
pub use stats::LatencyStats;
