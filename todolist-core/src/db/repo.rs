//! Task repository
//!
//! Owns the only connection to the store and exposes CRUD, listing and
//! batched operations over tasks. Every public call runs in its own
//! transaction; writes start with `BEGIN IMMEDIATE` so contention shows up
//! before any statement runs.

use super::retry::RetryPolicy;
use super::schema::ensure_schema;
use crate::error::{RepoError, StorageError};
use crate::task::{
    validate_title, Atomicity, NewTask, Operation, SortOrder, Task, TaskFilter, TaskId,
    TaskUpdate,
};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Column list matching `row_to_task`
const TASK_COLUMNS: &str = "id, title, done, created_at, priority, completed_at";

/// Handle to a task store.
///
/// Operations from multiple threads are serialized on an internal lock.
/// Contention from other connections to the same file surfaces as
/// [`RepoError::Busy`] after the [`RetryPolicy`] is exhausted.
pub struct TaskRepository {
    conn: Mutex<Connection>,
    retry: RetryPolicy,
}

impl TaskRepository {
    /// Open or create a store at the given path and ensure its schema.
    pub fn open(path: &Path, retry: RetryPolicy) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // SQLite's own busy handler would hide contention from the retry policy
        conn.busy_timeout(Duration::ZERO)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        ensure_schema(&conn)?;

        tracing::info!(path = %path.display(), "Opened task store");

        Ok(Self {
            conn: Mutex::new(conn),
            retry,
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            retry: RetryPolicy::default(),
        })
    }

    /// Release the connection, reporting any failure to close it cleanly.
    pub fn close(self) -> Result<(), StorageError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| StorageError::from(e))?;
        tracing::info!("Closed task store");
        Ok(())
    }

    // A panic mid-operation leaves no open transaction behind (it rolls back
    // on drop), so a poisoned lock still guards a consistent connection.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` in an immediate write transaction, retrying while busy.
    fn write<T, F>(&self, mut op: F) -> Result<T, RepoError>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, RepoError>,
    {
        self.retry.run(|| {
            let mut conn = self.lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Run `op` in a read transaction that is closed before returning.
    fn read<T, F>(&self, mut op: F) -> Result<T, RepoError>
    where
        F: FnMut(&Transaction<'_>) -> Result<T, RepoError>,
    {
        self.retry.run(|| {
            let mut conn = self.lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    // ============================================
    // Task operations
    // ============================================

    /// Create a task. The store assigns the id; `created_at` is stamped now.
    pub fn create(&self, new: NewTask) -> Result<Task, RepoError> {
        // Rejected before taking the write lock, so a busy store cannot mask it
        validate_title(&new.title).map_err(RepoError::InvalidInput)?;
        let task = self.write(|tx| insert_task(tx, &new))?;
        tracing::debug!(id = task.id, priority = task.priority, "Created task");
        Ok(task)
    }

    /// Get a task by id
    pub fn get(&self, id: TaskId) -> Result<Task, RepoError> {
        self.read(|tx| fetch_task(tx, id))
    }

    /// Apply the supplied field changes and return the updated task
    pub fn update(&self, id: TaskId, changes: TaskUpdate) -> Result<Task, RepoError> {
        if let Some(title) = &changes.title {
            validate_title(title).map_err(RepoError::InvalidInput)?;
        }
        let task = self.write(|tx| update_task(tx, id, &changes))?;
        tracing::debug!(id, done = task.done, "Updated task");
        Ok(task)
    }

    /// Delete a task. Deleting an unknown id is `NotFound`.
    pub fn delete(&self, id: TaskId) -> Result<(), RepoError> {
        self.write(|tx| delete_task(tx, id).map(|_| ()))?;
        tracing::debug!(id, "Deleted task");
        Ok(())
    }

    /// List tasks matching `filter` in the requested order.
    ///
    /// All rows come from one read transaction, so the result is a consistent
    /// snapshot of the store.
    pub fn list(&self, filter: &TaskFilter, order: SortOrder) -> Result<Vec<Task>, RepoError> {
        self.read(|tx| {
            let (where_sql, mut params) = filter_clause(filter);
            let mut sql = format!(
                "SELECT {} FROM tasks{} ORDER BY {}",
                TASK_COLUMNS,
                where_sql,
                order.order_by_sql()
            );

            if let Some(limit) = filter.limit {
                // SQLite limits are signed; anything larger means "no limit"
                sql.push_str(" LIMIT ?");
                params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
            }

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();

            let mut stmt = tx.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), row_to_task)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(tasks)
        })
    }

    /// Count tasks matching `filter` (its `limit` caps the count)
    pub fn count(&self, filter: &TaskFilter) -> Result<usize, RepoError> {
        let count = self.read(|tx| {
            let (where_sql, params) = filter_clause(filter);
            let sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let count: i64 = tx.query_row(&sql, params_refs.as_slice(), |r| r.get(0))?;
            Ok(count as usize)
        })?;

        Ok(filter.limit.map_or(count, |limit| count.min(limit)))
    }

    /// Execute several operations in one transaction.
    ///
    /// With [`Atomicity::AllOrNothing`] the first failure rolls back the whole
    /// batch and is returned as the error. With [`Atomicity::Independent`]
    /// each operation runs in its own savepoint: `NotFound` and `InvalidInput`
    /// are reported in place and the successes commit. Storage failures abort
    /// the batch in both modes.
    pub fn batch(
        &self,
        ops: &[Operation],
        atomicity: Atomicity,
    ) -> Result<Vec<Result<Task, RepoError>>, RepoError> {
        let outcomes = self.retry.run(|| {
            let mut conn = self.lock();
            let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut outcomes = Vec::with_capacity(ops.len());

            for (index, op) in ops.iter().enumerate() {
                match atomicity {
                    Atomicity::AllOrNothing => {
                        let task = apply_operation(&tx, op).map_err(|e| {
                            tracing::debug!(index, error = %e, "Batch rolled back");
                            e
                        })?;
                        outcomes.push(Ok(task));
                    }
                    Atomicity::Independent => {
                        let sp = tx.savepoint()?;
                        let outcome = apply_operation(&sp, op);
                        match outcome {
                            Ok(task) => {
                                sp.commit()?;
                                outcomes.push(Ok(task));
                            }
                            Err(e) if e.is_fatal() || e.is_retryable() => return Err(e),
                            Err(e) => {
                                // dropping the savepoint rolls this operation back
                                drop(sp);
                                outcomes.push(Err(e));
                            }
                        }
                    }
                }
            }

            tx.commit()?;
            Ok(outcomes)
        })?;

        tracing::debug!(operations = ops.len(), "Batch committed");
        Ok(outcomes)
    }

    /// Delete every task and return how many were removed.
    ///
    /// Ids of removed tasks stay retired.
    pub fn clear(&self) -> Result<usize, RepoError> {
        let removed = self.write(|tx| Ok(tx.execute("DELETE FROM tasks", [])?))?;
        tracing::info!(removed, "Cleared all tasks");
        Ok(removed)
    }

    /// Rebuild the database file to reclaim free pages.
    ///
    /// Maintenance only; holds the store exclusively while it runs.
    pub fn compact(&self) -> Result<(), RepoError> {
        self.retry.run(|| {
            let conn = self.lock();
            conn.execute_batch("VACUUM")?;
            Ok(())
        })?;
        tracing::info!("Compacted task store");
        Ok(())
    }
}

// ============================================
// Statement helpers (run inside a transaction)
// ============================================

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", ms).into(),
        )
    })
}

/// Map a row selected with [`TASK_COLUMNS`] to a task.
fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let created_at: i64 = row.get(3)?;
    let completed_at: Option<i64> = row.get(5)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        done: row.get(2)?,
        created_at: millis_to_datetime(3, created_at)?,
        priority: row.get(4)?,
        completed_at: completed_at
            .map(|ms| millis_to_datetime(5, ms))
            .transpose()?,
    })
}

fn filter_clause(filter: &TaskFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

    if let Some(done) = filter.done {
        sql.push_str(" AND done = ?");
        params.push(Box::new(done));
    }

    if let Some(priority_min) = filter.priority_min {
        sql.push_str(" AND priority >= ?");
        params.push(Box::new(priority_min));
    }

    (sql, params)
}

fn insert_task(conn: &Connection, new: &NewTask) -> Result<Task, RepoError> {
    validate_title(&new.title).map_err(RepoError::InvalidInput)?;

    let created_ms = now_millis();
    conn.execute(
        "INSERT INTO tasks (title, done, created_at, priority) VALUES (?1, 0, ?2, ?3)",
        params![new.title, created_ms, new.priority],
    )?;

    Ok(Task {
        id: conn.last_insert_rowid(),
        title: new.title.clone(),
        done: false,
        created_at: millis_to_datetime(3, created_ms)?,
        priority: new.priority,
        completed_at: None,
    })
}

fn fetch_task(conn: &Connection, id: TaskId) -> Result<Task, RepoError> {
    conn.query_row(
        &format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS),
        [id],
        row_to_task,
    )
    .optional()?
    .ok_or(RepoError::NotFound(id))
}

fn update_task(conn: &Connection, id: TaskId, changes: &TaskUpdate) -> Result<Task, RepoError> {
    if let Some(title) = &changes.title {
        validate_title(title).map_err(RepoError::InvalidInput)?;
    }

    let mut task = fetch_task(conn, id)?;
    if changes.is_empty() {
        return Ok(task);
    }

    if let Some(title) = &changes.title {
        task.title = title.clone();
    }
    if let Some(priority) = changes.priority {
        task.priority = priority;
    }
    if let Some(done) = changes.done {
        if done && !task.done {
            task.completed_at = Some(millis_to_datetime(5, now_millis())?);
        } else if !done {
            task.completed_at = None;
        }
        task.done = done;
    }

    conn.execute(
        "UPDATE tasks SET title = ?1, done = ?2, priority = ?3, completed_at = ?4 WHERE id = ?5",
        params![
            task.title,
            task.done,
            task.priority,
            task.completed_at.map(|t| t.timestamp_millis()),
            id,
        ],
    )?;

    Ok(task)
}

/// Delete and return the task as it was
fn delete_task(conn: &Connection, id: TaskId) -> Result<Task, RepoError> {
    let task = fetch_task(conn, id)?;
    conn.execute("DELETE FROM tasks WHERE id = ?", [id])?;
    Ok(task)
}

fn apply_operation(conn: &Connection, op: &Operation) -> Result<Task, RepoError> {
    match op {
        Operation::Create(new) => insert_task(conn, new),
        Operation::Update { id, changes } => update_task(conn, *id, changes),
        Operation::Delete(id) => delete_task(conn, *id),
    }
}
