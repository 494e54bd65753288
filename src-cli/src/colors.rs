//! Terminal color support for CLI output.
//!
//! Colors are only used when the stream is a terminal, so piped output stays
//! plain.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use stowbar_types::PermissionStatus;

/// Pad a string to a minimum width (left-aligned), then apply a color function.
/// Padding first keeps ANSI escapes out of the width calculation.
pub fn pad_left<F>(msg: &str, width: usize, color_fn: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let padded = format!("{:<width$}", msg);
    color_fn(&padded)
}

/// Check if stdout is a terminal (interactive mode).
pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a terminal (interactive mode).
pub fn is_stderr_interactive() -> bool {
    std::io::stderr().is_terminal()
}

/// Style for error messages.
pub fn error(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{} {}", "error:".red().bold(), msg)
    } else {
        format!("error: {}", msg)
    }
}

/// Style for warning messages.
pub fn warning(msg: &str) -> String {
    if is_stderr_interactive() {
        format!("{} {}", "warning:".yellow().bold(), msg)
    } else {
        format!("warning: {}", msg)
    }
}

/// Style for success messages.
pub fn success(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.green())
    } else {
        msg.to_string()
    }
}

/// Style for dim/secondary text.
pub fn dim(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.dimmed())
    } else {
        msg.to_string()
    }
}

/// Style for bold text.
pub fn bold(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.bold())
    } else {
        msg.to_string()
    }
}

/// Style for header text (bold + color).
pub fn header(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.bold().blue())
    } else {
        msg.to_string()
    }
}

/// Style for file paths.
pub fn path(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.underline())
    } else {
        msg.to_string()
    }
}

/// Style for numeric values (ids, coordinates, counts).
pub fn number(msg: &str) -> String {
    if is_interactive() {
        format!("{}", msg.cyan())
    } else {
        msg.to_string()
    }
}

pub fn yes() -> String {
    if is_interactive() {
        format!("{}", "yes".green())
    } else {
        "yes".to_string()
    }
}

pub fn no() -> String {
    if is_interactive() {
        format!("{}", "no".dimmed())
    } else {
        "no".to_string()
    }
}

/// Permission status with a color for its state.
pub fn permission_status(status: PermissionStatus) -> String {
    let text = status.as_str();
    if !is_interactive() {
        return text.to_string();
    }

    match status {
        PermissionStatus::Granted => format!("{}", text.green()),
        PermissionStatus::Denied => format!("{}", text.red().bold()),
        _ => format!("{}", text.yellow()),
    }
}
