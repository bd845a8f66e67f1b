//! todolist - persistent command-line task list
//!
//! Each subcommand maps to one task repository operation.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/todolist/tasks.db (~/.local/share/todolist/tasks.db)
//! - Logs: $XDG_STATE_HOME/todolist/todolist.log (~/.local/state/todolist/todolist.log)
//! - Config: $XDG_CONFIG_HOME/todolist/config.toml (~/.config/todolist/config.toml)
//!
//! Exit codes: 0 on success, 1 for recoverable errors (unknown id, invalid
//! input, busy store), 2 when the store or configuration is unusable.

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use todolist_core::logging::LoggingGuard;
use todolist_core::{
    Config, NewTask, RepoError, SortOrder, TaskFilter, TaskId, TaskRepository, TaskUpdate,
    DEFAULT_PRIORITY,
};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(about = "Manage a persistent task list")]
#[command(version)]
struct Args {
    /// Database file (overrides the configured path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task
    Add {
        /// Task title (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Higher priorities are listed first
        #[arg(short, long, default_value_t = DEFAULT_PRIORITY, allow_negative_numbers = true)]
        priority: i64,
    },

    /// List tasks
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        done: bool,

        /// Only tasks not yet completed
        #[arg(long)]
        pending: bool,

        /// Only tasks with at least this priority
        #[arg(long, allow_negative_numbers = true)]
        min_priority: Option<i64>,

        /// Sort order: priority (default) or newest
        #[arg(long, default_value = "priority")]
        sort: SortOrder,

        /// Maximum number of tasks to show
        #[arg(long)]
        limit: Option<usize>,

        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task as done
    Done { id: TaskId },

    /// Mark a task as not done
    Undo { id: TaskId },

    /// Change the title or priority of a task
    Edit {
        id: TaskId,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New priority
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,
    },

    /// Delete a task
    Remove { id: TaskId },

    /// Delete all tasks
    Clear {
        /// Confirm deleting every task
        #[arg(long)]
        yes: bool,
    },

    /// Reclaim unused space in the database file
    Compact,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Outlives `run` so failures reported below still reach the log file
    let mut log_guard = None;

    match run(args, &mut log_guard) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

/// Print the error and choose the exit code for it.
fn report(err: &anyhow::Error) -> ExitCode {
    let code = exit_status(err);
    if code == 1 {
        tracing::info!(error = %err, "Command rejected");
        eprintln!("error: {}", err);
    } else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        eprintln!("error: {:#}", err);
    }
    ExitCode::from(code)
}

/// 1 for errors the user can fix by changing the request, 2 for everything else.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RepoError>() {
        Some(repo_err) if !repo_err.is_fatal() => 1,
        _ => 2,
    }
}

fn run(args: Args, log_guard: &mut Option<LoggingGuard>) -> Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, so stdout only carries command output)
    *log_guard = Some(
        todolist_core::logging::init(&config.logging).context("failed to initialize logging")?,
    );

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.store.database_path());
    tracing::info!(path = %db_path.display(), "Opening task store");

    let repo = TaskRepository::open(&db_path, config.store.retry_policy())
        .with_context(|| format!("failed to open task store at {}", db_path.display()))?;

    let color = !args.no_color && std::io::stdout().is_terminal();
    execute(&repo, args.command, color)?;

    repo.close().context("failed to close task store")?;
    Ok(())
}

fn execute(repo: &TaskRepository, command: Command, color: bool) -> Result<()> {
    match command {
        Command::Add { title, priority } => {
            let task = repo.create(NewTask::new(title.join(" ")).with_priority(priority))?;
            println!("Added task {}: {}", task.id, task.title);
        }

        Command::List {
            done,
            pending,
            min_priority,
            sort,
            limit,
            json,
        } => {
            let filter = TaskFilter {
                done: if done {
                    Some(true)
                } else if pending {
                    Some(false)
                } else {
                    None
                },
                priority_min: min_priority,
                limit,
            };
            let tasks = repo.list(&filter, sort)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    println!("{}", render::task_line(task, color));
                }
            }
        }

        Command::Done { id } => {
            let task = repo.update(id, TaskUpdate::done(true))?;
            println!("Completed task {}: {}", task.id, task.title);
        }

        Command::Undo { id } => {
            let task = repo.update(id, TaskUpdate::done(false))?;
            println!("Reopened task {}: {}", task.id, task.title);
        }

        Command::Edit {
            id,
            title,
            priority,
        } => {
            let changes = TaskUpdate {
                title,
                priority,
                ..Default::default()
            };
            if changes.is_empty() {
                return Err(RepoError::InvalidInput(
                    "nothing to change, pass --title or --priority".to_string(),
                )
                .into());
            }
            let task = repo.update(id, changes)?;
            println!("Updated task {}: {}", task.id, task.title);
        }

        Command::Remove { id } => {
            repo.delete(id)?;
            println!("Removed task {}", id);
        }

        Command::Clear { yes } => {
            if !yes {
                return Err(RepoError::InvalidInput(
                    "refusing to delete all tasks without --yes".to_string(),
                )
                .into());
            }
            let removed = repo.clear()?;
            println!("Cleared {} task(s)", removed);
        }

        Command::Compact => {
            repo.compact()?;
            println!("Compacted task store");
        }
    }

    Ok(())
}
