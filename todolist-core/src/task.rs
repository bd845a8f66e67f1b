//! Core domain types for todolist
//!
//! A [`Task`] is the only persisted entity. The other types describe what a
//! caller may ask of the repository: new tasks, field-level changes, list
//! filters and orderings, and batched operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier. Never reused, even after deletion.
pub type TaskId = i64;

/// Priority given to tasks created without one
pub const DEFAULT_PRIORITY: i64 = 0;

/// A persisted to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier assigned on creation
    pub id: TaskId,
    /// Non-empty title
    pub title: String,
    /// Completion flag
    pub done: bool,
    /// When the task was created (immutable)
    pub created_at: DateTime<Utc>,
    /// Ordering key for listings; higher sorts first
    pub priority: i64,
    /// When the task was last marked done, if it currently is
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub priority: i64,
}

impl NewTask {
    /// A task with the default priority
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// Field-level changes applied by an update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub done: Option<bool>,
    pub priority: Option<i64>,
}

impl TaskUpdate {
    /// Mark the task done (or not done)
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.done.is_none() && self.priority.is_none()
    }
}

/// Filter for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks with this completion state
    pub done: Option<bool>,
    /// Only tasks with `priority >= priority_min`
    pub priority_min: Option<i64>,
    /// Maximum number of tasks to return
    pub limit: Option<usize>,
}

/// Ordering of listed tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Highest priority first, then oldest first
    #[default]
    ByPriorityThenCreated,
    /// Newest first
    ByCreatedDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::ByPriorityThenCreated => "by_priority_then_created",
            SortOrder::ByCreatedDesc => "by_created_desc",
        }
    }

    /// SQL `ORDER BY` clause. The id tie-break makes the order total.
    pub(crate) fn order_by_sql(&self) -> &'static str {
        match self {
            SortOrder::ByPriorityThenCreated => "priority DESC, created_at ASC, id ASC",
            SortOrder::ByCreatedDesc => "created_at DESC, id DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by_priority_then_created" | "priority" => Ok(SortOrder::ByPriorityThenCreated),
            "by_created_desc" | "newest" => Ok(SortOrder::ByCreatedDesc),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// One step of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create(NewTask),
    Update { id: TaskId, changes: TaskUpdate },
    Delete(TaskId),
}

/// How a batch reacts to a failing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atomicity {
    /// Roll back everything on the first failure
    AllOrNothing,
    /// Report each outcome separately and keep the successes
    Independent,
}

/// Reject titles that are empty or whitespace-only
pub(crate) fn validate_title(title: &str) -> std::result::Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title("  padded  ").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(" \t\n").is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(
            "priority".parse::<SortOrder>().unwrap(),
            SortOrder::ByPriorityThenCreated
        );
        assert_eq!(
            "by_created_desc".parse::<SortOrder>().unwrap(),
            SortOrder::ByCreatedDesc
        );
        assert!("oldest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_task_update_builders() {
        assert!(TaskUpdate::default().is_empty());
        let update = TaskUpdate::done(true);
        assert_eq!(update.done, Some(true));
        assert!(update.title.is_none());
        assert!(!update.is_empty());
    }
}
