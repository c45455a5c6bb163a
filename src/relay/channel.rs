//! Relay channel: read, tee to log, forward, re-arm.
//!
//! A [`Channel`] exclusively owns its source, sink and log file. Its loop
//! is strictly sequential: a chunk is logged and fully forwarded before the
//! next read is issued, so bytes leave in the order they arrived.
//!
//! # Close-all
//!
//! The read races the close-all token with the read polled first. Bytes
//! that are already readable when the child exits are still relayed; the
//! channel closes as soon as a read would block.
//!
//! # Sink failure
//!
//! A drain channel whose console sink fails stops forwarding and keeps
//! reading and logging, so the child can still write and the log stays
//! complete. The stdin-forward channel closes instead.

use std::io::{self, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{ChannelKind, CloseReason, RelayOutcome};
use crate::session::LogFile;

/// One open relay channel.
#[derive(Debug)]
pub struct Channel<R, W> {
    kind: ChannelKind,
    source: R,
    sink: W,
    log: LogFile,
    buffer: Vec<u8>,
}

impl<R, W> Channel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Bind a source, sink and log into an open channel.
    ///
    /// `capacity` is the size of the transfer buffer and the upper bound of
    /// a single read. A zero capacity is raised to one byte.
    #[must_use]
    pub fn new(kind: ChannelKind, source: R, sink: W, log: LogFile, capacity: usize) -> Self {
        Self {
            kind,
            source,
            sink,
            log,
            buffer: vec![0; capacity.max(1)],
        }
    }

    /// Which channel this is.
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Run the relay loop until the channel closes.
    ///
    /// Never fails: EOF and I/O errors are the normal way a channel learns
    /// it is finished, and are reported in the returned [`RelayOutcome`].
    /// The source, sink and log are all released before this returns.
    pub async fn run(mut self, close_all: CancellationToken) -> RelayOutcome {
        let mut bytes: u64 = 0;
        let mut sink_error: Option<String> = None;

        let reason = loop {
            let read = tokio::select! {
                biased;

                read = self.source.read(&mut self.buffer) => read,

                () = close_all.cancelled() => break CloseReason::Shutdown,
            };

            let n = match read {
                Ok(0) => break CloseReason::Eof,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => break CloseReason::SourceError(err.to_string()),
            };

            let chunk = &self.buffer[..n];
            trace!(channel = %self.kind, n, "chunk read");

            if let Err(err) = self.log.append(chunk) {
                warn!(
                    channel = %self.kind,
                    path = %self.log.path().display(),
                    error = %err,
                    "log append failed, closing channel"
                );
                break CloseReason::LogError(err.to_string());
            }

            bytes += n as u64;

            if sink_error.is_some() {
                continue;
            }
            if let Err(err) = forward(&mut self.sink, chunk).await {
                if self.kind.closes_on_sink_error() {
                    break CloseReason::SinkError(err.to_string());
                }
                warn!(
                    channel = %self.kind,
                    error = %err,
                    "console write failed, logging only from now on"
                );
                sink_error = Some(err.to_string());
            }
        };

        self.close(bytes, reason, sink_error).await
    }

    async fn close(
        self,
        bytes: u64,
        reason: CloseReason,
        sink_error: Option<String>,
    ) -> RelayOutcome {
        let Self {
            kind,
            source,
            mut sink,
            log,
            ..
        } = self;

        drop(source);
        if sink_error.is_none() {
            if let Err(err) = sink.shutdown().await {
                debug!(channel = %kind, error = %err, "sink shutdown failed");
            }
        }
        drop(sink);
        drop(log);

        debug!(channel = %kind, bytes, reason = %reason, "channel closed");

        RelayOutcome {
            channel: kind,
            bytes,
            reason,
            sink_error,
        }
    }
}

/// Write the whole chunk to the sink, looping over short writes, then flush.
async fn forward<W: AsyncWrite + Unpin>(sink: &mut W, chunk: &[u8]) -> io::Result<()> {
    sink.write_all(chunk).await?;
    sink.flush().await
}
