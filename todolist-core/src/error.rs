//! Error types for todolist-core
//!
//! The store reports two layers of failure:
//! - [`StorageError`] for problems with the backing file or its schema
//! - [`RepoError`] for the outcome of a repository operation
//!
//! [`Error`] covers the ambient layers (configuration, logging).

use crate::task::TaskId;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Failure of the embedded store itself
#[derive(Error, Debug)]
pub enum StorageError {
    /// The file could not be created, opened, read or written
    #[error("storage I/O failure: {0}")]
    IoFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An existing table does not have the shape this build expects
    #[error("schema mismatch in table `{table}`: {detail}")]
    SchemaMismatch { table: String, detail: String },

    /// Another connection holds a conflicting lock
    #[error("store is busy")]
    Busy,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                StorageError::Busy
            }
            _ => StorageError::IoFailure(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoFailure(Box::new(err))
    }
}

/// Outcome of a failed repository operation
#[derive(Error, Debug)]
pub enum RepoError {
    /// No live task has this id
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The caller supplied a value that would violate an invariant
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Write contention outlasted the retry policy
    #[error("store is busy, try again")]
    Busy,

    /// Fatal storage failure
    #[error(transparent)]
    Storage(StorageError),
}

impl RepoError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Busy)
    }

    /// Whether the store itself is unusable (I/O failure or schema mismatch)
    pub fn is_fatal(&self) -> bool {
        matches!(self, RepoError::Storage(_))
    }
}

impl From<StorageError> for RepoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Busy => RepoError::Busy,
            other => RepoError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::from(err).into()
    }
}

/// Main error type for configuration and process setup
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for todolist-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_and_locked_map_to_busy() {
        let busy = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        assert!(matches!(busy, StorageError::Busy));

        let locked = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED));
        assert!(matches!(locked, StorageError::Busy));
    }

    #[test]
    fn test_other_failures_are_io() {
        let err = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_NOTADB));
        assert!(matches!(err, StorageError::IoFailure(_)));

        let err = RepoError::from(sqlite_failure(rusqlite::ffi::SQLITE_CANTOPEN));
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_repo_error_classification() {
        assert!(RepoError::Busy.is_retryable());
        assert!(!RepoError::NotFound(7).is_fatal());
        assert_eq!(RepoError::NotFound(7).to_string(), "task 7 not found");
    }
}
