//! # todolist-core
//!
//! Core library for todolist - a persistent task list backed by SQLite.
//!
//! This library provides:
//! - Domain types for tasks, filters and batched operations
//! - Schema management and the task repository
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use todolist_core::{Config, NewTask, SortOrder, TaskFilter, TaskRepository};
//!
//! let config = Config::load().expect("failed to load config");
//! let repo = TaskRepository::open(&config.store.database_path(), config.store.retry_policy())
//!     .expect("failed to open store");
//!
//! repo.create(NewTask::new("Water the plants")).expect("failed to create task");
//! for task in repo.list(&TaskFilter::default(), SortOrder::default()).expect("failed to list") {
//!     println!("{} {}", task.id, task.title);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{RetryPolicy, TaskRepository};
pub use error::{Error, RepoError, Result, StorageError};
pub use task::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod task;
