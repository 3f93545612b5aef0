//! Logging sink abstraction.
//!
//! The bridge emits diagnostics through a host-provided sink so that an
//! embedding application keeps a single logging pipeline. The sink call is
//! synchronous: at the embedding boundary the host's logging entry point is
//! an ordinary function call, and implementations are expected to be cheap
//! or to buffer internally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured log entry forwarded to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Target module/component
    pub target: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: HashMap<String, String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Forwards structured diagnostics to the host's logging pipeline.
///
/// The bridge mirrors its own `tracing` events into this sink when one is
/// configured; implementations map entries onto whatever the host uses
/// (slf4j behind a JNI boundary, `os_log`, a file).
///
/// Entries below [`min_level`](LogSink::min_level) are filtered out at the
/// source and never reach [`log`](LogSink::log).
pub trait LogSink: Send + Sync {
    /// Forward one entry to the host logging system.
    fn log(&self, entry: LogEntry);

    /// Minimum level the sink wants to receive.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Stdout sink for development and tests.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    pub min_level: LogLevel,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, entry: LogEntry) {
        let level_str = match entry.level {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };

        println!(
            "[{}] {} {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level_str,
            entry.target,
            entry.message
        );

        if !entry.fields.is_empty() {
            println!("  Fields: {:?}", entry.fields);
        }
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}
