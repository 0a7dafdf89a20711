//! Interactive console surface for collection warnings
//!
//! Separate from the incident log: the log is the durable record, the
//! console is what a technician watching the run sees.

use owo_colors::OwoColorize;
use std::sync::Mutex;

/// Where human-readable collection warnings go
pub trait ConsoleSink: Send + Sync {
    fn warn(&self, section: &str, message: &str);
}

/// Colored warnings on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrConsole;

impl ConsoleSink for StderrConsole {
    fn warn(&self, section: &str, message: &str) {
        eprintln!(
            "{} {} {}",
            "WARNING".yellow().bold(),
            format!("[{}]", section).dimmed(),
            message
        );
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentConsole;

impl ConsoleSink for SilentConsole {
    fn warn(&self, _section: &str, _message: &str) {}
}

/// Keeps warnings in memory, for callers that render them later
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<String>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ConsoleSink for MemoryConsole {
    fn warn(&self, section: &str, message: &str) {
        let line = format!("[{}] {}", section, message);
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}
