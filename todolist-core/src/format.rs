//! Formatting helpers shared by the command-line tools.

use chrono::{DateTime, Local, Utc};

/// Format a timestamp in local time as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Format a latency in microseconds with a readable unit.
pub fn format_micros(micros: f64) -> String {
    if micros >= 1_000_000.0 {
        format!("{:.2}s", micros / 1_000_000.0)
    } else if micros >= 1_000.0 {
        format!("{:.2}ms", micros / 1_000.0)
    } else {
        format!("{:.1}µs", micros)
    }
}
