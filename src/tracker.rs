//! # Log Tracker Core
//!
//! `LogTracker` owns the three cooperating pieces of the library:
//!
//! - the **interception controller**, which snapshots the four console
//!   channel bindings and replaces them with level-tagged wrappers into the
//!   emitter, restoring the exact originals on stop;
//! - the **formatter/emitter**, the single level-gated path every message
//!   takes to the console and, optionally, the log file;
//! - the **sampler**, a restartable periodic task that feeds resource-usage
//!   payloads through the same emitter.
//!
//! The tracker is a process-wide singleton by intent: the console channels
//! and the log file are shared resources, and independent instances would
//! race on them during start/stop.

use crate::config::TrackerConfig;
use crate::console::{Channel, ChannelWriter, ConsoleSinks, ProcessConsole};
use crate::format;
use crate::level::LogLevel;
use crate::probe::{ResourceProbe, SystemProbe};
use crate::sink::{FileSink, SinkError, TokioFileSink};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Process-local log interception, file mirroring and resource sampling.
///
/// See the [crate docs](crate) for the overall model. All methods are
/// non-blocking and infallible; failures surface only as additional
/// error-level log lines.
pub struct LogTracker {
    inner: Arc<Inner>,
}

struct Inner {
    console: Arc<dyn ConsoleSinks>,
    sink: Arc<dyn FileSink>,
    probe: Arc<dyn ResourceProbe>,
    /// Handle back to this instance for tasks that must not keep it alive.
    weak_self: Weak<Inner>,
    state: Mutex<State>,
}

struct State {
    config: TrackerConfig,
    /// Original channel bindings; `Some` iff interception is active.
    saved: Option<SavedChannels>,
    /// Sampler task; `Some` iff the sampler is running.
    monitoring: Option<JoinHandle<()>>,
}

struct SavedChannels {
    log: ChannelWriter,
    info: ChannelWriter,
    warn: ChannelWriter,
    error: ChannelWriter,
}

impl LogTracker {
    /// Create a tracker over the real process console, a `tokio::fs` file
    /// sink, and the system resource probe.
    pub fn new() -> Self {
        Self::with_collaborators(
            Arc::new(ProcessConsole::new()),
            Arc::new(TokioFileSink),
            Arc::new(SystemProbe::new()),
        )
    }

    /// Create a tracker with injected collaborators.
    ///
    /// Tests use this with a [`BufferedConsole`](crate::console::BufferedConsole)
    /// so interception never touches the real process output.
    pub fn with_collaborators(
        console: Arc<dyn ConsoleSinks>,
        sink: Arc<dyn FileSink>,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        Self {
            inner: Arc::new_cyclic(|weak| Inner {
                console,
                sink,
                probe,
                weak_self: weak.clone(),
                state: Mutex::new(State {
                    config: TrackerConfig::default(),
                    saved: None,
                    monitoring: None,
                }),
            }),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> TrackerConfig {
        self.inner.state.lock().config.clone()
    }

    /// Set the minimum severity emitted.
    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.state.lock().config.log_level = level;
    }

    /// Set the log line template.
    ///
    /// No validation is performed; a template without placeholders is
    /// emitted verbatim for every message.
    pub fn set_log_format(&self, format: impl Into<String>) {
        self.inner.state.lock().config.log_format = format.into();
    }

    /// Enable or disable mirroring of emitted lines to the log file.
    pub fn set_log_to_file(&self, enabled: bool) {
        self.inner.state.lock().config.log_to_file = enabled;
    }

    /// Set the log file path; takes effect on the next write.
    pub fn set_log_file_path(&self, path: impl Into<PathBuf>) {
        self.inner.state.lock().config.log_file_path = path.into();
    }

    /// Set the sampler period; takes effect on the next sampler start.
    pub fn set_monitoring_interval(&self, interval: Duration) {
        self.inner.state.lock().config.monitoring_interval = interval;
    }

    /// Whether console interception is currently active.
    pub fn is_logging(&self) -> bool {
        self.inner.state.lock().saved.is_some()
    }

    /// Whether the sampler is currently running.
    pub fn is_monitoring(&self) -> bool {
        self.inner.state.lock().monitoring.is_some()
    }

    /// Start intercepting the four console channels.
    ///
    /// Snapshots the current channel bindings and replaces them with
    /// wrappers into the emitter: the generic and info channels map to
    /// `info`, warn to `warning`, error to `error`. If file mirroring is
    /// enabled, the target file is eagerly created/truncated fire-and-forget
    /// and a creation failure is reported through the error channel.
    ///
    /// A no-op when already active. The active check happens before the
    /// snapshot, so a repeated start can never capture the wrappers
    /// themselves and make restoration impossible.
    pub fn start_logging(&self) {
        let mut state = self.inner.state.lock();
        if state.saved.is_some() {
            return;
        }

        state.saved = Some(SavedChannels {
            log: self.inner.console.read(Channel::Log),
            info: self.inner.console.read(Channel::Info),
            warn: self.inner.console.read(Channel::Warn),
            error: self.inner.console.read(Channel::Error),
        });

        let mappings = [
            (Channel::Log, LogLevel::Info),
            (Channel::Info, LogLevel::Info),
            (Channel::Warn, LogLevel::Warning),
            (Channel::Error, LogLevel::Error),
        ];
        for (channel, level) in mappings {
            let weak = Arc::downgrade(&self.inner);
            self.inner.console.write(
                channel,
                Arc::new(move |text: &str| {
                    if let Some(inner) = weak.upgrade() {
                        inner.emit(level, &[Value::String(text.to_string())], true);
                    }
                }),
            );
        }

        let eager_create = state
            .config
            .log_to_file
            .then(|| state.config.log_file_path.clone());
        drop(state);

        if let Some(path) = eager_create {
            let sink = Arc::clone(&self.inner.sink);
            self.inner
                .spawn_io(async move { sink.create_or_truncate(&path).await });
        }
        debug!("console interception started");
    }

    /// Stop intercepting and restore the original channel bindings.
    ///
    /// Also stops the sampler if it is running, so after this returns no
    /// further emissions of any kind occur except file appends already in
    /// flight. A no-op when interception was never started.
    pub fn stop_logging(&self) {
        self.stop_monitoring();

        let mut state = self.inner.state.lock();
        let Some(saved) = state.saved.take() else {
            return;
        };
        self.inner.console.write(Channel::Log, saved.log);
        self.inner.console.write(Channel::Info, saved.info);
        self.inner.console.write(Channel::Warn, saved.warn);
        self.inner.console.write(Channel::Error, saved.error);
        debug!("console interception stopped");
    }

    /// Emit a message at `level` built from an ordered list of values.
    ///
    /// Values serialize per [`format::render_value`] and join with single
    /// spaces. Gated by the configured level; nothing propagates to the
    /// caller under any input.
    pub fn log(&self, level: LogLevel, values: &[Value]) {
        self.inner.emit(level, values, true);
    }

    /// Emit an info-level message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, &[Value::String(message.to_string())]);
    }

    /// Emit a warning-level message.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, &[Value::String(message.to_string())]);
    }

    /// Emit an error-level message.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &[Value::String(message.to_string())]);
    }

    /// Start the periodic sampler.
    ///
    /// Captures the monitoring interval as configured right now; changing
    /// the interval afterwards only affects the next start. Each tick feeds
    /// one resource-usage payload through the normal `info`-gated emit path,
    /// so a configured level above `info` silences the output while the
    /// timer keeps firing. A no-op when already running.
    ///
    /// Without a current tokio runtime the sampler cannot be scheduled; the
    /// call leaves the sampler stopped and reports a console-only
    /// error-level line instead.
    pub fn start_monitoring(&self) {
        let mut state = self.inner.state.lock();
        if state.monitoring.is_some() {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                drop(state);
                self.inner.emit(
                    LogLevel::Error,
                    &[Value::String(
                        "monitoring not started: no tokio runtime available".to_string(),
                    )],
                    false,
                );
                return;
            }
        };

        let interval = state.config.monitoring_interval;
        let weak = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately;
            // consume it so samples start one full period after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.sample_once();
            }
        });
        state.monitoring = Some(task);
        debug!(interval_ms = interval.as_millis() as u64, "resource monitoring started");
    }

    /// Stop the periodic sampler.
    ///
    /// Cancels the timer task and clears the handle. File appends already
    /// triggered by a delivered tick still complete. A no-op when stopped.
    pub fn stop_monitoring(&self) {
        let mut state = self.inner.state.lock();
        if let Some(task) = state.monitoring.take() {
            task.abort();
            debug!("resource monitoring stopped");
        }
    }

    /// Take one resource-usage sample and emit it immediately.
    ///
    /// This is the body of a sampler tick, exposed so callers (and tests)
    /// can trigger a sample without waiting out the interval.
    pub fn sample_once(&self) {
        self.inner.sample_once();
    }
}

impl Default for LogTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// The single emit path: gate, serialize, format, console write, then
    /// the optional fire-and-forget file append.
    ///
    /// `mirror_to_file` is false for internal failure reports, which bounds
    /// the error-reporting recursion: a report about a failed append never
    /// attempts another append.
    fn emit(&self, level: LogLevel, values: &[Value], mirror_to_file: bool) {
        let state = self.state.lock();
        if level < state.config.log_level {
            return;
        }

        let message = format::join_values(values);
        let line = format::format_line(
            &state.config.log_format,
            &format::timestamp_now(),
            level,
            &message,
        );
        // Write through the saved original channel, never the installed
        // wrapper; when interception is inactive the live binding is the
        // original.
        let writer = match &state.saved {
            Some(saved) => Arc::clone(&saved.log),
            None => self.console.read(Channel::Log),
        };
        let file_path = (mirror_to_file && state.config.log_to_file)
            .then(|| state.config.log_file_path.clone());
        drop(state);

        writer(&line);

        if let Some(path) = file_path {
            let sink = Arc::clone(&self.sink);
            let bytes = {
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                bytes
            };
            self.spawn_io(async move { sink.append(&path, &bytes).await });
        }
    }

    /// Spawn a fire-and-forget file operation, reporting its failure as a
    /// console-only error-level line.
    ///
    /// Without a current tokio runtime the operation is skipped and a
    /// console-only diagnostic is emitted instead.
    fn spawn_io<F>(&self, op: F)
    where
        F: Future<Output = Result<(), SinkError>> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let weak = self.weak_self.clone();
                runtime.spawn(async move {
                    if let Err(err) = op.await {
                        if let Some(inner) = weak.upgrade() {
                            inner.report_sink_error(&err);
                        }
                    }
                });
            }
            Err(_) => {
                self.emit(
                    LogLevel::Error,
                    &[Value::String(
                        "log file write skipped: no tokio runtime available".to_string(),
                    )],
                    false,
                );
            }
        }
    }

    fn report_sink_error(&self, err: &SinkError) {
        debug!(error = %err, "log file operation failed");
        self.emit(LogLevel::Error, &[Value::String(err.to_string())], false);
    }

    fn sample_once(&self) {
        let usage = self.probe.snapshot().into_usage(Utc::now());
        let value = serde_json::to_value(&usage)
            .unwrap_or_else(|_| Value::String(format::UNSERIALIZABLE.to_string()));
        self.emit(LogLevel::Info, &[value], true);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().monitoring.take() {
            task.abort();
        }
    }
}
