//! Benchmark scenarios and the loop that measures them

use crate::error::{HarnessError, Phase};
use crate::report::ScenarioReport;
use crate::scratch::ScratchStore;
use crate::stats::LatencyStats;
use std::fmt;
use std::hint::black_box;
use std::str::FromStr;
use std::time::Instant;
use todolist_core::{NewTask, RepoError, SortOrder, TaskFilter, TaskUpdate};

/// A workload run against a fresh scratch store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// `create` into a store that starts empty
    SingleInsert,
    /// `get` of existing ids, round-robin
    LookupById,
    /// Unfiltered `list` of the whole store, once per iteration
    ListAll,
    /// `update` toggling `done` and cycling priority on existing ids
    UpdateHeavy,
    /// `delete` of a distinct existing id per iteration
    DeleteHeavy,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::SingleInsert,
        Scenario::LookupById,
        Scenario::ListAll,
        Scenario::UpdateHeavy,
        Scenario::DeleteHeavy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::SingleInsert => "single_insert",
            Scenario::LookupById => "lookup_by_id",
            Scenario::ListAll => "list_all",
            Scenario::UpdateHeavy => "update_heavy",
            Scenario::DeleteHeavy => "delete_heavy",
        }
    }

    /// Warm-up and measured iteration counts for this scenario.
    pub fn iterations(&self, config: &HarnessConfig) -> (usize, usize) {
        match self {
            Scenario::ListAll => (config.list_warmup, config.list_iterations),
            _ => (config.warmup, config.iterations),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Scenario::ALL.iter().map(Scenario::name).collect();
                format!("unknown scenario `{}` (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Iteration counts and store sizes for a harness run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Discarded iterations before measuring, per CRUD scenario
    pub warmup: usize,
    /// Measured iterations per CRUD scenario
    pub iterations: usize,
    /// Store sizes swept by `list_all`
    pub list_sizes: Vec<usize>,
    pub list_warmup: usize,
    pub list_iterations: usize,
    /// Rows present before `lookup_by_id` and `update_heavy` start
    pub seed_rows: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup: 50,
            iterations: 1_000,
            list_sizes: vec![1_000, 10_000, 100_000],
            list_warmup: 2,
            list_iterations: 10,
            seed_rows: 10_000,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.iterations == 0 || self.list_iterations == 0 {
            return Err(HarnessError::Config(
                "measured iterations must be at least 1".to_string(),
            ));
        }
        if self.seed_rows == 0 {
            return Err(HarnessError::Config(
                "seed_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows to seed before `scenario` runs with `rows` requested.
    fn seed_count(&self, scenario: Scenario, rows: usize) -> usize {
        match scenario {
            Scenario::SingleInsert => 0,
            Scenario::DeleteHeavy => {
                let (warmup, iterations) = scenario.iterations(self);
                rows.max(warmup + iterations)
            }
            _ => rows,
        }
    }
}

/// Expand the selected scenarios into `(scenario, rows)` runs.
///
/// `list_all` runs once per configured size.
pub fn plan(config: &HarnessConfig, scenarios: &[Scenario]) -> Vec<(Scenario, usize)> {
    scenarios
        .iter()
        .flat_map(|&scenario| match scenario {
            Scenario::ListAll => config.list_sizes.iter().map(|&n| (scenario, n)).collect(),
            Scenario::SingleInsert => vec![(scenario, 0)],
            _ => vec![(scenario, config.seed_rows)],
        })
        .collect()
}

/// Run one scenario in its own scratch store.
///
/// `progress` is called once per warm-up or measured iteration. Any
/// repository error aborts the scenario.
pub fn run_scenario<P>(
    scenario: Scenario,
    rows: usize,
    config: &HarnessConfig,
    mut progress: P,
) -> Result<ScenarioReport, HarnessError>
where
    P: FnMut(usize),
{
    let name = scenario.name();
    let (warmup, iterations) = scenario.iterations(config);
    let store = ScratchStore::new()?;

    let seed = config.seed_count(scenario, rows);
    let ids = store
        .seed(seed)
        .map_err(HarnessError::scenario(name, Phase::Seed, 0))?;
    if ids.is_empty() && matches!(scenario, Scenario::LookupById | Scenario::UpdateHeavy) {
        return Err(HarnessError::scenario(name, Phase::Seed, 0)(
            RepoError::InvalidInput("scenario needs at least one seeded task".to_string()),
        ));
    }
    tracing::info!(scenario = name, rows = seed, warmup, iterations, "Running scenario");

    let repo = store.repo();
    let op = |i: usize| -> Result<(), RepoError> {
        match scenario {
            Scenario::SingleInsert => repo
                .create(NewTask::new(format!("bench task {}", i)))
                .map(drop),
            Scenario::LookupById => repo.get(ids[i % ids.len()]).map(drop),
            Scenario::ListAll => {
                let tasks = repo.list(&TaskFilter::default(), SortOrder::ByPriorityThenCreated)?;
                black_box(tasks.len());
                Ok(())
            }
            Scenario::UpdateHeavy => {
                let changes = TaskUpdate {
                    done: Some(i % 2 == 0),
                    priority: Some((i % 10) as i64),
                    ..Default::default()
                };
                repo.update(ids[i % ids.len()], changes).map(drop)
            }
            Scenario::DeleteHeavy => repo.delete(ids[i]),
        }
    };

    for i in 0..warmup {
        op(i).map_err(HarnessError::scenario(name, Phase::Warmup, i))?;
        progress(1);
    }

    let mut samples = Vec::with_capacity(iterations);
    let started = Instant::now();
    for j in 0..iterations {
        let t = Instant::now();
        op(warmup + j).map_err(HarnessError::scenario(name, Phase::Measure, j))?;
        samples.push(t.elapsed());
        progress(1);
    }
    let elapsed = started.elapsed();

    let stats = LatencyStats::from_samples(&samples, elapsed)
        .ok_or_else(|| HarnessError::Config("no measured iterations".to_string()))?;
    tracing::info!(
        scenario = name,
        p50_us = stats.p50_us,
        p99_us = stats.p99_us,
        throughput = stats.throughput,
        "Scenario finished"
    );

    Ok(ScenarioReport {
        scenario: name.to_string(),
        rows: seed,
        warmup,
        iterations,
        stats,
    })
}
