//! # Log Tracker
//!
//! A process-local logging and lightweight metrics-sampling library. The
//! tracker intercepts the four console-style output channels of a process,
//! reformats every message with a configurable timestamp/level/message
//! template, optionally mirrors formatted lines to a single log file, and can
//! periodically sample process resource usage (CPU time, process memory,
//! system memory pressure) and emit it through the same logging path.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `tracker`: The `LogTracker` itself: interception lifecycle, the gated
//!   formatter/emitter, and the restartable sampling loop
//! - `console`: Injectable abstraction over the four console channels so
//!   interception can be exercised against an isolated channel set
//! - `level`: Totally ordered log severity levels and their parsing
//! - `config`: The tracker's mutable configuration knobs
//! - `format`: Value serialization and log-line template substitution
//! - `sink`: Asynchronous file-append collaborator backed by `tokio::fs`
//! - `probe`: Resource-snapshot collaborator backed by `sysinfo`/`getrusage`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use log_tracker::{LogLevel, LogTracker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tracker = LogTracker::new();
//!     tracker.set_log_level(LogLevel::Info);
//!     tracker.set_log_to_file(true);
//!     tracker.set_log_file_path("app.log");
//!
//!     // Route the process console channels through the tracker.
//!     tracker.start_logging();
//!
//!     // Periodically emit resource-usage samples through the same path.
//!     tracker.start_monitoring();
//!
//!     tracker.warn("disk space is getting low");
//!
//!     tracker.stop_logging(); // restores the channels, stops the sampler
//! }
//! ```
//!
//! ## Failure Model
//!
//! No operation on the tracker blocks, panics, or returns an error. Invalid
//! configuration degrades gracefully (a template without placeholders is
//! emitted verbatim), values that cannot be serialized render as a
//! placeholder, and file I/O failures surface only as additional error-level
//! log lines on the console. File appends are fire-and-forget; their
//! completion order across concurrent emissions is not guaranteed.
//!
//! ## Concurrency
//!
//! The tracker is intended to be created once per process. The four console
//! channels and the log file are process-wide resources; independent tracker
//! instances would race on them during start/stop and must not be created.

pub mod config;
pub mod console;
pub mod format;
pub mod level;
pub mod probe;
pub mod sink;
pub mod tracker;

pub use config::TrackerConfig;
pub use console::{
    BufferedConsole, CapturedLine, Channel, ChannelWriter, ConsoleSinks, ProcessConsole,
};
pub use level::{LogLevel, ParseLevelError};
pub use probe::{
    CpuTimes, MemoryBreakdown, ResourceProbe, ResourceSnapshot, ResourceUsage, SystemProbe,
};
pub use sink::{FileSink, SinkError, TokioFileSink};
pub use tracker::LogTracker;

/// The current version of the log tracker library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// These defaults mirror the tracker's out-of-the-box behavior: console-only
/// output at `info` level with a five second sampling period.
pub mod defaults {
    use crate::level::LogLevel;
    use std::time::Duration;

    /// Default minimum severity emitted
    pub const LOG_LEVEL: LogLevel = LogLevel::Info;

    /// Default log line template
    ///
    /// The `{timestamp}`, `{level}` and `{message}` placeholders are each
    /// substituted exactly once per emitted line; any of them may be omitted.
    pub const LOG_FORMAT: &str = "{timestamp} [{level}] {message}";

    /// Default log file path, used when file mirroring is enabled without an
    /// explicit path
    pub const LOG_FILE_PATH: &str = "app.log";

    /// Default sampler period
    ///
    /// The interval is read when the sampler starts; changing it while the
    /// sampler runs takes effect on the next restart.
    pub const MONITORING_INTERVAL: Duration = Duration::from_millis(5000);
}
