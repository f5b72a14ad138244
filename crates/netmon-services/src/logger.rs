//! # Logger Implementations
//!
//! [`LoggerService`] forwards the [`Logger`] facade to `tracing`, so service
//! log lines land in whatever subscriber the entry point installed.
//! [`MockLogger`] captures entries for assertions.

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use netmon_types::Logger;

/// Production logger backed by `tracing`.
pub struct LoggerService;

impl LoggerService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggerService {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for LoggerService {
    fn debug(&self, message: &str, context: Option<Value>) {
        match context {
            Some(ctx) => debug!(context = %ctx, "{message}"),
            None => debug!("{message}"),
        }
    }

    fn info(&self, message: &str, context: Option<Value>) {
        match context {
            Some(ctx) => info!(context = %ctx, "{message}"),
            None => info!("{message}"),
        }
    }

    fn warn(&self, message: &str, context: Option<Value>) {
        match context {
            Some(ctx) => warn!(context = %ctx, "{message}"),
            None => warn!("{message}"),
        }
    }

    fn error(&self, message: &str, context: Option<Value>) {
        match context {
            Some(ctx) => error!(context = %ctx, "{message}"),
            None => error!("{message}"),
        }
    }
}

/// Severity of a captured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One captured log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: Option<Value>,
}

/// Logger double that records entries instead of printing them.
#[derive(Default)]
pub struct MockLogger {
    entries: RwLock<Vec<LogEntry>>,
}

impl MockLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Captured messages at one level.
    #[must_use]
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str, context: Option<Value>) {
        self.entries.write().push(LogEntry {
            level,
            message: message.to_string(),
            context,
        });
    }
}

impl Logger for MockLogger {
    fn debug(&self, message: &str, context: Option<Value>) {
        self.push(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: Option<Value>) {
        self.push(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: Option<Value>) {
        self.push(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: Option<Value>) {
        self.push(LogLevel::Error, message, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_logger_captures_levels() {
        let logger = MockLogger::new();
        logger.info("starting", None);
        logger.error("failed", Some(json!({"code": 7})));

        assert_eq!(logger.entries().len(), 2);
        assert_eq!(logger.messages_at(LogLevel::Error), vec!["failed"]);
        assert_eq!(
            logger.entries()[1].context,
            Some(json!({"code": 7}))
        );
    }
}
