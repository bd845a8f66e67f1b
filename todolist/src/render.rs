//! Terminal rendering of tasks.

use crossterm::style::{style, Color, Stylize};
use todolist_core::format::format_timestamp;
use todolist_core::Task;

/// Paint `text` when color output is enabled.
fn paint(text: impl std::fmt::Display, color: Color, enabled: bool) -> String {
    if enabled {
        style(text.to_string()).with(color).to_string()
    } else {
        text.to_string()
    }
}

/// One line per task: id, title, status, priority and timestamps.
pub fn task_line(task: &Task, color: bool) -> String {
    let mut line = paint(format!("{:>4}. {}", task.id, task.title), Color::Blue, color);

    if task.done {
        line.push_str(&paint(" [Done]", Color::Green, color));
    } else {
        line.push_str(&paint(" [Not Done]", Color::Yellow, color));
    }

    if task.priority != 0 {
        line.push_str(&format!(" (priority {})", task.priority));
    }

    line.push_str(&format!(
        " (Created: {})",
        paint(format_timestamp(task.created_at), Color::Green, color)
    ));

    if let Some(completed_at) = task.completed_at {
        line.push_str(&paint(
            format!(" (Completed: {})", format_timestamp(completed_at)),
            Color::Green,
            color,
        ));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: 3,
            title: "Water plants".to_string(),
            done: false,
            created_at: std::time::SystemTime::now().into(),
            priority: 0,
            completed_at: None,
        }
    }

    #[test]
    fn test_plain_line() {
        let line = task_line(&sample_task(), false);
        assert!(line.starts_with("   3. Water plants [Not Done] (Created: "));
        assert!(!line.contains("priority"));
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_done_line_with_priority() {
        let mut task = sample_task();
        task.done = true;
        task.priority = 2;
        task.completed_at = Some(task.created_at);

        let line = task_line(&task, false);
        assert!(line.contains("[Done] (priority 2)"));
        assert!(line.contains("(Completed: "));
    }

    #[test]
    fn test_colored_line_has_escapes() {
        // crossterm honours NO_COLOR globally
        if std::env::var_os("NO_COLOR").is_some() {
            return;
        }
        let line = task_line(&sample_task(), true);
        assert!(line.contains('\u{1b}'));
    }
}
