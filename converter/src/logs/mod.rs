//! Pipeline progress log.
//!
//! Every entry is forwarded to `tracing` and also kept in a process-wide
//! log book, so a run summary can carry the messages of the run that
//! produced it. Entries are filed under the thread that logged them; a
//! conversion runs on one thread, so concurrent runs keep separate logs.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Log level of a pipeline message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log book
pub static LOG_BOOK: Lazy<LogBook> = Lazy::new(LogBook::new);

/// Collects log entries and forwards them to the tracing subscriber
pub struct LogBook {
    entries: Mutex<HashMap<ThreadId, Vec<LogEntry>>>,
}

impl LogBook {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, Vec<LogEntry>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an entry and emit it as a tracing event
    pub fn log(&self, entry: LogEntry) {
        let indent = "   ".repeat(entry.indent as usize);
        match entry.level {
            LogLevel::Info => tracing::info!("{}{}", indent, entry.message),
            LogLevel::Success => tracing::info!(status = "ok", "{}{}", indent, entry.message),
            LogLevel::Warning => tracing::warn!("{}{}", indent, entry.message),
            LogLevel::Error => tracing::error!("{}{}", indent, entry.message),
        }

        self.lock()
            .entry(thread::current().id())
            .or_default()
            .push(entry);
    }

    /// Take every entry the current thread recorded so far
    pub fn drain(&self) -> Vec<LogEntry> {
        self.lock()
            .remove(&thread::current().id())
            .unwrap_or_default()
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BOOK.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BOOK.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BOOK.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BOOK.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BOOK.log(LogEntry::info(msg).with_indent(indent));
}

pub fn log_success_indent(msg: impl Into<String>, indent: u8) {
    LOG_BOOK.log(LogEntry::success(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_book_drains_in_order() {
        let book = LogBook::new();
        book.log(LogEntry::info("first"));
        book.log(LogEntry::warning("second").with_indent(1));

        let entries = book.drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[1].indent, 1);
        assert!(book.drain().is_empty());
    }

    #[test]
    fn test_threads_keep_separate_entries() {
        let book = LogBook::new();
        book.log(LogEntry::info("main"));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                book.log(LogEntry::info("worker"));
                let entries = book.drain();
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].message, "worker");
            });
        });

        let entries = book.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "main");
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::success("done")).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["indent"], 0);
    }
}
