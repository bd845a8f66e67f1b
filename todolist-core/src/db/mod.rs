//! Database layer for todolist
//!
//! This module provides the storage layer using SQLite with:
//! - Schema creation and validation
//! - Repository pattern for task operations
//! - Bounded retry for busy stores

pub mod repo;
pub mod retry;
pub mod schema;

pub use repo::TaskRepository;
pub use retry::RetryPolicy;
pub use schema::{ensure_schema, get_schema_version, SCHEMA_VERSION};
