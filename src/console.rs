//! # Console Channel Abstraction
//!
//! The tracker intercepts four named console-style output channels: the
//! generic channel plus info, warn and error. On a real process these map to
//! stdout/stderr; in tests they map to an in-memory buffer. Interception
//! works by reading the current writer bound to each channel (to snapshot
//! it) and replacing it with a wrapper, so the channel set is modeled as an
//! injectable read/replace seam rather than ambient process globals.

use parking_lot::Mutex;
use std::sync::Arc;

/// A writer currently bound to a console channel.
///
/// Writers are shared and cloneable so a snapshot taken at interception
/// start can restore the exact same binding (pointer identity included) at
/// interception stop.
pub type ChannelWriter = Arc<dyn Fn(&str) + Send + Sync>;

/// The four standard console channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Generic output channel
    Log,
    /// Informational channel
    Info,
    /// Warning channel
    Warn,
    /// Error channel
    Error,
}

impl Channel {
    /// All channels, in snapshot/restore order.
    pub const ALL: [Channel; 4] = [Channel::Log, Channel::Info, Channel::Warn, Channel::Error];

    fn index(self) -> usize {
        match self {
            Channel::Log => 0,
            Channel::Info => 1,
            Channel::Warn => 2,
            Channel::Error => 3,
        }
    }
}

/// Read-and-replace access to a set of console channels.
///
/// Implementations must hand out the *current* binding from `read` and
/// atomically install a new one in `write`; the tracker relies on that to
/// snapshot originals before wrapping and to restore them afterwards.
pub trait ConsoleSinks: Send + Sync {
    /// The writer currently bound to `channel`.
    fn read(&self, channel: Channel) -> ChannelWriter;

    /// Replace the writer bound to `channel`.
    fn write(&self, channel: Channel, writer: ChannelWriter);

    /// Route `text` through whatever writer is currently bound to `channel`.
    ///
    /// This is the path ordinary code uses to produce console output; once
    /// interception is active it lands in the tracker's wrapper.
    fn dispatch(&self, channel: Channel, text: &str) {
        let writer = self.read(channel);
        writer(text);
    }
}

/// Console channels of the real process: `Log` and `Info` write to stdout,
/// `Warn` and `Error` to stderr.
pub struct ProcessConsole {
    channels: Mutex<[ChannelWriter; 4]>,
}

impl ProcessConsole {
    pub fn new() -> Self {
        let stdout: ChannelWriter = Arc::new(|text: &str| println!("{text}"));
        let stderr: ChannelWriter = Arc::new(|text: &str| eprintln!("{text}"));
        Self {
            channels: Mutex::new([
                Arc::clone(&stdout),
                stdout,
                Arc::clone(&stderr),
                stderr,
            ]),
        }
    }
}

impl Default for ProcessConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSinks for ProcessConsole {
    fn read(&self, channel: Channel) -> ChannelWriter {
        Arc::clone(&self.channels.lock()[channel.index()])
    }

    fn write(&self, channel: Channel, writer: ChannelWriter) {
        self.channels.lock()[channel.index()] = writer;
    }
}

/// A line captured by a [`BufferedConsole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub channel: Channel,
    pub text: String,
}

/// An isolated console whose initial writers capture lines into memory.
///
/// Used by the test suite in place of [`ProcessConsole`] so interception can
/// be exercised without mutating the real process output; also useful for
/// embedders that want to inspect tracker output programmatically.
pub struct BufferedConsole {
    channels: Mutex<[ChannelWriter; 4]>,
    captured: Arc<Mutex<Vec<CapturedLine>>>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let make_writer = |channel: Channel| -> ChannelWriter {
            let captured = Arc::clone(&captured);
            Arc::new(move |text: &str| {
                captured.lock().push(CapturedLine {
                    channel,
                    text: text.to_string(),
                });
            })
        };
        let channels = Channel::ALL.map(make_writer);
        Self {
            channels: Mutex::new(channels),
            captured,
        }
    }

    /// Everything captured so far, in write order.
    pub fn captured(&self) -> Vec<CapturedLine> {
        self.captured.lock().clone()
    }

    /// Captured line texts, dropping the channel tags.
    pub fn lines(&self) -> Vec<String> {
        self.captured.lock().iter().map(|l| l.text.clone()).collect()
    }

    /// Whether any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.captured.lock().iter().any(|l| l.text.contains(needle))
    }

    /// Discard everything captured so far.
    pub fn clear(&self) {
        self.captured.lock().clear();
    }
}

impl Default for BufferedConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSinks for BufferedConsole {
    fn read(&self, channel: Channel) -> ChannelWriter {
        Arc::clone(&self.channels.lock()[channel.index()])
    }

    fn write(&self, channel: Channel, writer: ChannelWriter) {
        self.channels.lock()[channel.index()] = writer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_console_captures_dispatches() {
        let console = BufferedConsole::new();

        console.dispatch(Channel::Log, "hello");
        console.dispatch(Channel::Error, "boom");

        let captured = console.captured();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].channel, Channel::Log);
        assert_eq!(captured[0].text, "hello");
        assert_eq!(captured[1].channel, Channel::Error);
        assert!(console.contains("boom"));
    }

    #[test]
    fn test_read_returns_current_binding() {
        let console = BufferedConsole::new();
        let original = console.read(Channel::Warn);

        // Reading twice without a write returns the same binding.
        assert!(Arc::ptr_eq(&original, &console.read(Channel::Warn)));

        let replacement: ChannelWriter = Arc::new(|_| {});
        console.write(Channel::Warn, Arc::clone(&replacement));
        assert!(Arc::ptr_eq(&replacement, &console.read(Channel::Warn)));
        assert!(!Arc::ptr_eq(&original, &console.read(Channel::Warn)));
    }

    #[test]
    fn test_replaced_writer_receives_dispatches() {
        let console = BufferedConsole::new();
        let hits = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&hits);
        console.write(
            Channel::Info,
            Arc::new(move |_| {
                *counter.lock() += 1;
            }),
        );

        console.dispatch(Channel::Info, "one");
        console.dispatch(Channel::Info, "two");

        assert_eq!(*hits.lock(), 2);
        // The replacement bypassed the capture buffer entirely.
        assert!(console.captured().is_empty());
    }
}
