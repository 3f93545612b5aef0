//! # Host Capability Contract
//!
//! Traits that an embedding host provides to the bridge. The bridge core
//! deliberately owns very little: diagnostics are forwarded through a
//! host-supplied sink rather than a logging configuration of the bridge's
//! own, so the embedder's pipeline (JVM logger, `os_log`, syslog) stays the
//! single source of truth.
//!
//! All traits require `Send + Sync`; the bridge calls them from runtime
//! worker threads.

pub mod error;
pub mod logging;

pub use error::HostError;
pub use logging::{ConsoleSink, LogEntry, LogLevel, LogSink};
