use colored::{ColoredString, Colorize};

use crate::models::{Severity, Status};

/// Human-readable byte size: 512 B, 1.5 KB, 2.0 MB
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = *next;
    }
    format!("{value:.1} {unit}")
}

pub fn status_label(status: Status) -> ColoredString {
    match status {
        Status::Pass => status.as_str().green().bold(),
        Status::Fail => status.as_str().red().bold(),
    }
}

pub fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => severity.as_str().red(),
        Severity::Medium => severity.as_str().yellow(),
        Severity::Low => severity.as_str().normal(),
    }
}

/// Shortens an ISO-8601 UTC stamp to seconds for table display.
pub fn short_stamp(stamp: &str) -> &str {
    stamp.get(..19).unwrap_or(stamp)
}
