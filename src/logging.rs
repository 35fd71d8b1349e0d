//! Category logging for Legion
//!
//! Lines go to the console and into a small in-memory buffer the webview can
//! read back. Nothing is written to disk.
//! - DAEMON: run lifecycle and panel actions
//! - COMPLETION: provider requests
//! - NORMALIZE: response clean-up
//! - EDITOR: formatting and replacement
//! - ERROR: failures surfaced to the user

use chrono::Local;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

const RECENT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Daemon,
    Completion,
    Normalize,
    Editor,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Daemon => "DAEMON",
            LogCategory::Completion => "COMPLETION",
            LogCategory::Normalize => "NORMALIZE",
            LogCategory::Editor => "EDITOR",
            LogCategory::Error => "ERROR",
        }
    }
}

struct LogState {
    console: bool,
    recent: VecDeque<String>,
}

static LOG_STATE: Lazy<Mutex<LogState>> = Lazy::new(|| {
    Mutex::new(LogState {
        console: true,
        recent: VecDeque::with_capacity(RECENT_CAPACITY),
    })
});

/// Turns console echo on or off. The recent-lines buffer is always kept.
pub fn init_logging(console: bool) {
    LOG_STATE.lock().unwrap_or_else(PoisonError::into_inner).console = console;
    log(LogCategory::Daemon, None, "Legion logging initialized");
}

/// Log a message with category and optional run context
pub fn log(category: LogCategory, run_id: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let run_context = run_id
        .map(|id| format!("run={} | ", &id[..8.min(id.len())]))
        .unwrap_or_default();

    let line = format!("[{}] [{}] {}{}", timestamp, category.as_str(), run_context, message);

    let mut state = LOG_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    if state.console {
        println!("{}", line);
    }
    if state.recent.len() == RECENT_CAPACITY {
        state.recent.pop_front();
    }
    state.recent.push_back(line);
}

pub fn log_daemon(run_id: Option<&str>, message: &str) {
    log(LogCategory::Daemon, run_id, message);
}

pub fn log_completion(run_id: Option<&str>, message: &str) {
    log(LogCategory::Completion, run_id, message);
}

pub fn log_normalize(run_id: Option<&str>, message: &str) {
    log(LogCategory::Normalize, run_id, message);
}

pub fn log_editor(run_id: Option<&str>, message: &str) {
    log(LogCategory::Editor, run_id, message);
}

pub fn log_error(run_id: Option<&str>, message: &str) {
    log(LogCategory::Error, run_id, message);
}

/// Most recent lines, oldest first.
pub fn recent_lines() -> Vec<String> {
    LOG_STATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .recent
        .iter()
        .cloned()
        .collect()
}

pub fn clear_recent() {
    LOG_STATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .recent
        .clear();
}

/// First characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut shortened: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        shortened.push_str("...");
    }
    shortened.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_carry_category_and_run() {
        log_completion(Some("0123456789abcdef"), "marker-line-for-test");
        let line = recent_lines()
            .into_iter()
            .rev()
            .find(|l| l.contains("marker-line-for-test"))
            .unwrap();
        assert!(line.contains("[COMPLETION] run=01234567 | marker-line-for-test"));
    }

    #[test]
    fn test_preview_shortens_and_flattens() {
        assert_eq!(preview("a\nb", 10), "a\\nb");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
