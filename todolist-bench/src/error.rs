//! Harness-level failures

use std::fmt;
use thiserror::Error;
use todolist_core::{RepoError, StorageError};

/// Stage of a scenario in which an operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seed,
    Warmup,
    Measure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Seed => "seeding",
            Phase::Warmup => "warm-up",
            Phase::Measure => "measurement",
        })
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    /// The harness settings cannot produce a measurement
    #[error("invalid harness configuration: {0}")]
    Config(String),

    /// The scratch directory could not be created
    #[error("failed to create scratch directory: {0}")]
    ScratchDir(#[from] std::io::Error),

    /// The scratch store could not be opened
    #[error("failed to open scratch store: {0}")]
    Setup(#[from] StorageError),

    /// A repository operation failed while the scenario was running
    #[error("scenario `{scenario}` failed during {phase} at iteration {iteration}: {source}")]
    Scenario {
        scenario: String,
        phase: Phase,
        iteration: usize,
        #[source]
        source: RepoError,
    },
}

impl HarnessError {
    pub(crate) fn scenario(
        scenario: &str,
        phase: Phase,
        iteration: usize,
    ) -> impl FnOnce(RepoError) -> HarnessError + '_ {
        move |source| HarnessError::Scenario {
            scenario: scenario.to_string(),
            phase,
            iteration,
            source,
        }
    }
}
