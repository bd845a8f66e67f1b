use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use todolist_core::{RetryPolicy, SortOrder, TaskFilter, TaskRepository};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("todolist/tasks.db")
    }

    /// Concatenated contents of every rotated log file
    fn log_contents(&self) -> String {
        let log_dir = self.xdg_state.join("todolist");
        let mut contents = String::new();
        for entry in fs::read_dir(&log_dir).expect("log directory should exist") {
            let path = entry.unwrap().path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("todolist.log"));
            if is_log {
                contents.push_str(&fs::read_to_string(&path).unwrap());
            }
        }
        contents
    }

    fn run(&self, args: &[&str]) -> Output {
        let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("todolist"));

        Command::new(bin_path)
            .args(args)
            .env("HOME", &self.home)
            .env("XDG_DATA_HOME", &self.xdg_data)
            .env("XDG_CONFIG_HOME", &self.xdg_config)
            .env("XDG_STATE_HOME", &self.xdg_state)
            .env_remove("RUST_LOG")
            .output()
            .unwrap_or_else(|e| panic!("failed to execute todolist: {e}"))
    }
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "todolist {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = env.run(args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn add_list_done_remove_round_trip() {
    let env = CliTestEnv::new();

    let out = run_ok(&env, &["add", "Buy", "milk"]);
    assert!(out.contains("Added task 1: Buy milk"), "stdout: {out}");
    run_ok(&env, &["add", "File taxes", "--priority", "5"]);

    let listed = run_ok(&env, &["list"]);
    let lines: Vec<_> = listed.lines().collect();
    assert_eq!(lines.len(), 2, "stdout: {listed}");
    assert!(lines[0].contains("File taxes"));
    assert!(lines[1].contains("Buy milk [Not Done]"));

    let out = run_ok(&env, &["done", "1"]);
    assert!(out.contains("Completed task 1"));

    let done = run_ok(&env, &["list", "--done"]);
    assert!(done.contains("Buy milk [Done]"));
    assert!(done.contains("(Completed: "));
    assert!(!done.contains("File taxes"));

    run_ok(&env, &["remove", "1"]);

    let repo = TaskRepository::open(&env.db_path(), RetryPolicy::default())
        .expect("db should exist after CLI run");
    let tasks = repo
        .list(&TaskFilter::default(), SortOrder::ByPriorityThenCreated)
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "File taxes");
    assert_eq!(tasks[0].priority, 5);
}

#[test]
fn list_json_is_machine_readable() {
    let env = CliTestEnv::new();
    run_ok(&env, &["add", "first"]);
    run_ok(&env, &["add", "second"]);

    let out = run_ok(&env, &["list", "--json", "--sort", "newest"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
    let titles: Vec<_> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[test]
fn recoverable_errors_exit_with_one() {
    let env = CliTestEnv::new();

    let output = env.run(&["done", "42"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("task 42 not found"), "stderr: {stderr}");

    let output = env.run(&["add", "   "]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid input"));

    let output = env.run(&["clear"]);
    assert_eq!(output.status.code(), Some(1));

    let listed = run_ok(&env, &["list"]);
    assert!(listed.contains("No tasks."));
}

#[test]
fn schema_mismatch_exits_with_two() {
    let env = CliTestEnv::new();
    let db = env.xdg_data.join("legacy.db");

    let conn = Connection::open(&db).expect("failed to create legacy db");
    conn.execute_batch(
        "CREATE TABLE tasks (id INTEGER PRIMARY KEY, description TEXT, done INTEGER);
         INSERT INTO tasks (description, done) VALUES ('from the old tool', 0);",
    )
    .expect("failed to write legacy table");
    drop(conn);

    let db_arg = db.to_string_lossy().into_owned();
    let output = env.run(&["--db", &db_arg, "list"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schema mismatch"), "stderr: {stderr}");

    // The CLI must not have rewritten the foreign table
    let conn = Connection::open(&db).unwrap();
    let description: String = conn
        .query_row("SELECT description FROM tasks", [], |r| r.get(0))
        .unwrap();
    assert_eq!(description, "from the old tool");

    let log = env.log_contents();
    assert!(log.contains("Command failed"), "log: {log}");
    assert!(log.contains("schema mismatch"), "log: {log}");
}

#[test]
fn clear_with_confirmation_removes_everything() {
    let env = CliTestEnv::new();
    run_ok(&env, &["add", "one"]);
    run_ok(&env, &["add", "two"]);

    let out = run_ok(&env, &["clear", "--yes"]);
    assert!(out.contains("Cleared 2 task(s)"));

    let out = run_ok(&env, &["add", "three"]);
    assert!(out.contains("Added task 3"), "ids must not be reused: {out}");

    run_ok(&env, &["compact"]);
}
