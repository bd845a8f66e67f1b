//! Throwaway file-backed stores for benchmarking

use crate::error::HarnessError;
use todolist_core::{
    Atomicity, NewTask, Operation, RepoError, RetryPolicy, TaskId, TaskRepository,
};
use tempfile::TempDir;

/// Rows inserted per seeding transaction
const SEED_CHUNK: usize = 5_000;

/// A repository backed by a file in a private temporary directory.
///
/// The directory and the database in it are removed on drop.
pub struct ScratchStore {
    // Declared before `dir` so the connection closes before the files go away
    repo: TaskRepository,
    dir: TempDir,
}

impl ScratchStore {
    /// Create an empty store.
    ///
    /// Busy retries are disabled: the harness is the only writer, so a busy
    /// store indicates a problem rather than contention to wait out.
    pub fn new() -> Result<Self, HarnessError> {
        let dir = tempfile::Builder::new()
            .prefix("todolist-bench-")
            .tempdir()?;
        let repo = TaskRepository::open(&dir.path().join("bench.db"), RetryPolicy::no_retry())?;
        tracing::debug!(dir = %dir.path().display(), "Created scratch store");
        Ok(Self { repo, dir })
    }

    pub fn repo(&self) -> &TaskRepository {
        &self.repo
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Insert `rows` tasks with varied priorities and return their ids in
    /// insertion order.
    pub fn seed(&self, rows: usize) -> Result<Vec<TaskId>, RepoError> {
        let mut ids = Vec::with_capacity(rows);
        let mut next = 0;

        while next < rows {
            let end = (next + SEED_CHUNK).min(rows);
            let ops: Vec<_> = (next..end)
                .map(|i| {
                    Operation::Create(
                        NewTask::new(format!("seed task {}", i)).with_priority((i % 10) as i64),
                    )
                })
                .collect();

            for outcome in self.repo.batch(&ops, Atomicity::AllOrNothing)? {
                ids.push(outcome?.id);
            }
            next = end;
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todolist_core::TaskFilter;

    #[test]
    fn test_seed_inserts_in_chunks() {
        let store = ScratchStore::new().unwrap();
        let ids = store.seed(SEED_CHUNK + 7).unwrap();

        assert_eq!(ids.len(), SEED_CHUNK + 7);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            store.repo().count(&TaskFilter::default()).unwrap(),
            SEED_CHUNK + 7
        );
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let store = ScratchStore::new().unwrap();
        let dir = store.dir().to_path_buf();
        assert!(dir.join("bench.db").exists());

        drop(store);
        assert!(!dir.exists());
    }
}
