//! Byte-stream relay channels.
//!
//! Each of the three channels (stdin-forward, stdout-drain, stderr-drain)
//! runs the same loop: read from its source, append the bytes to its log,
//! forward them to its sink, repeat. A channel stops on source EOF, on a
//! source or log error, or when the close-all signal fires after the child
//! exits. A sink error closes the stdin-forward channel; the drain channels
//! stop forwarding but keep logging until their source is done.
//!
//! Submodules:
//! - `channel`: the [`Channel`] type and its relay loop.

pub mod channel;

use std::fmt::{Display, Formatter};

pub use channel::Channel;

/// Logical identity and direction of a relay channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChannelKind {
    /// Wrapper stdin → child stdin.
    StdinForward,
    /// Child stdout → wrapper stdout.
    StdoutDrain,
    /// Child stderr → wrapper stderr.
    StderrDrain,
}

impl ChannelKind {
    /// Short name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StdinForward => "stdin",
            Self::StdoutDrain => "stdout",
            Self::StderrDrain => "stderr",
        }
    }

    /// Whether a failed sink write ends the channel.
    ///
    /// Only stdin-forward closes: its sink is the child's stdin, so a write
    /// error means the child no longer reads it. The drain channels write to
    /// the console, and losing the console must not cut the log short or
    /// close the child's output pipe.
    #[must_use]
    pub const fn closes_on_sink_error(self) -> bool {
        matches!(self, Self::StdinForward)
    }
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a channel closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The source reported end of stream.
    Eof,
    /// Reading from the source failed.
    SourceError(String),
    /// Writing to the child's stdin failed; drain channels never close this way.
    SinkError(String),
    /// Appending to the channel's log file failed.
    LogError(String),
    /// The close-all signal fired because the child exited.
    Shutdown,
}

impl Display for CloseReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eof => f.write_str("eof"),
            Self::SourceError(msg) => write!(f, "source error: {msg}"),
            Self::SinkError(msg) => write!(f, "sink error: {msg}"),
            Self::LogError(msg) => write!(f, "log error: {msg}"),
            Self::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Final report of a closed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Which channel closed.
    pub channel: ChannelKind,
    /// Total bytes read from the source and appended to the log.
    pub bytes: u64,
    /// What stopped the channel.
    pub reason: CloseReason,
    /// First sink write failure of a drain channel that kept logging after
    /// it.
    pub sink_error: Option<String>,
}
