//! Database schema management
//!
//! Creates the `tasks` table and its indices, and validates an existing table
//! against the expected shape. A mismatching store is reported, never altered.
//! The schema version is tracked in `PRAGMA user_version`.

use crate::error::StorageError;
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Name of the only persisted table
pub const TASKS_TABLE: &str = "tasks";

const CREATE_TASKS: &str = r#"
    CREATE TABLE tasks (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        title        TEXT NOT NULL,
        done         INTEGER NOT NULL DEFAULT 0,
        created_at   INTEGER NOT NULL,     -- Unix epoch milliseconds (UTC)
        priority     INTEGER NOT NULL DEFAULT 0,
        completed_at INTEGER               -- set while done = 1
    );
"#;

const CREATE_INDEXES: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_tasks_priority_created ON tasks(priority, created_at);
    CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
"#;

/// Supporting indices and the columns they must cover, in order
const EXPECTED_INDEXES: &[(&str, &[&str])] = &[
    ("idx_tasks_priority_created", &["priority", "created_at"]),
    ("idx_tasks_created_at", &["created_at"]),
];

/// Expected column layout: (name, declared type, not null, primary key)
const EXPECTED_COLUMNS: &[(&str, &str, bool, bool)] = &[
    ("id", "INTEGER", false, true),
    ("title", "TEXT", true, false),
    ("done", "INTEGER", true, false),
    ("created_at", "INTEGER", true, false),
    ("priority", "INTEGER", true, false),
    ("completed_at", "INTEGER", false, false),
];

/// Ensure the store has the tasks table and indices.
///
/// Safe to call on every startup: an initialized store is left untouched.
pub fn ensure_schema(conn: &Connection) -> Result<(), StorageError> {
    let tx = conn.unchecked_transaction()?;

    let current_version = get_schema_version(&tx)?;
    if current_version > SCHEMA_VERSION {
        return Err(StorageError::SchemaMismatch {
            table: TASKS_TABLE.to_string(),
            detail: format!(
                "store has schema version {}, this build supports up to {}",
                current_version, SCHEMA_VERSION
            ),
        });
    }

    match table_sql(&tx, TASKS_TABLE)? {
        Some(sql) => validate_tasks_table(&tx, &sql)?,
        None => {
            tracing::info!(version = SCHEMA_VERSION, "Creating tasks table");
            tx.execute_batch(CREATE_TASKS)?;
        }
    }

    validate_indexes(&tx)?;
    tx.execute_batch(CREATE_INDEXES)?;

    if current_version < SCHEMA_VERSION {
        tx.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Schema initialized"
        );
    }

    tx.commit()?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32, StorageError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

fn table_sql(conn: &Connection, table: &str) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        [table],
        |r| r.get(0),
    )
    .optional()
    .map_err(StorageError::from)
}

fn mismatch(detail: String) -> StorageError {
    StorageError::SchemaMismatch {
        table: TASKS_TABLE.to_string(),
        detail,
    }
}

/// Compare an existing tasks table column by column.
fn validate_tasks_table(conn: &Connection, create_sql: &str) -> Result<(), StorageError> {
    let mut stmt = conn.prepare("PRAGMA table_info(tasks)")?;
    let columns = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i64>(5)? > 0,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (name, decl_type, not_null, pk) in EXPECTED_COLUMNS {
        let Some((_, actual_type, actual_not_null, actual_pk)) =
            columns.iter().find(|(n, ..)| n == name)
        else {
            return Err(mismatch(format!("missing column `{}`", name)));
        };

        if !actual_type.eq_ignore_ascii_case(decl_type) {
            return Err(mismatch(format!(
                "column `{}` has type `{}`, expected `{}`",
                name, actual_type, decl_type
            )));
        }
        if actual_not_null != not_null || actual_pk != pk {
            return Err(mismatch(format!(
                "column `{}` has different constraints",
                name
            )));
        }
    }

    if let Some((name, ..)) = columns
        .iter()
        .find(|(n, ..)| !EXPECTED_COLUMNS.iter().any(|(e, ..)| e == n))
    {
        return Err(mismatch(format!("unexpected column `{}`", name)));
    }

    // Without AUTOINCREMENT SQLite may hand out the id of a deleted max row again.
    if !create_sql.to_ascii_uppercase().contains("AUTOINCREMENT") {
        return Err(mismatch("`id` is not AUTOINCREMENT".to_string()));
    }

    Ok(())
}

/// Check that any index already using one of our names covers the expected columns.
fn validate_indexes(conn: &Connection) -> Result<(), StorageError> {
    for (index, expected) in EXPECTED_INDEXES {
        let table: Option<String> = conn
            .query_row(
                "SELECT tbl_name FROM sqlite_master WHERE type = 'index' AND name = ?",
                [index],
                |r| r.get(0),
            )
            .optional()?;
        let Some(table) = table else {
            continue;
        };

        let mut stmt = conn.prepare(&format!("PRAGMA index_info({})", index))?;
        let columns = stmt
            .query_map([], |row| {
                // NULL for expression columns
                Ok(row.get::<_, Option<String>>(2)?.unwrap_or_default())
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if table != TASKS_TABLE || columns != *expected {
            return Err(mismatch(format!(
                "index `{}` covers {}({}), expected {}({})",
                index,
                table,
                columns.join(", "),
                TASKS_TABLE,
                expected.join(", ")
            )));
        }
    }
    Ok(())
}
