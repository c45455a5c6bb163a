//! Event loop wiring for one wrapped run.
//!
//! Spawns the child, binds the three relay channels to its pipes and to the
//! wrapper's console, and drives them concurrently on the calling task until
//! every channel has closed. Only then does it collect the child's
//! termination status from the exit observer.
//!
//! The caller is expected to run this on a current-thread runtime, so all
//! relay work is interleaved on a single thread.

use std::process::ExitStatus;

use tokio::io::{AsyncRead, AsyncWrite, Stderr, Stdin, Stdout};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::process::spawner::{monitor_exit, spawn_child, SpawnedChild};
use crate::process::{self, Invocation, UNKNOWN_EXIT_CODE};
use crate::relay::{Channel, ChannelKind, RelayOutcome};
use crate::session::StreamLogs;
use crate::Result;

/// The wrapper's own standard streams.
#[derive(Debug)]
pub struct Console<I, O, E> {
    /// Source of the stdin-forward channel.
    pub stdin: I,
    /// Sink of the stdout-drain channel.
    pub stdout: O,
    /// Sink of the stderr-drain channel.
    pub stderr: E,
}

impl Console<Stdin, Stdout, Stderr> {
    /// The process's inherited stdin, stdout and stderr.
    #[must_use]
    pub fn inherited() -> Self {
        Self {
            stdin: tokio::io::stdin(),
            stdout: tokio::io::stdout(),
            stderr: tokio::io::stderr(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// OS process id of the child, if reported.
    pub pid: Option<u32>,
    /// Termination status, or `None` if waiting on the child failed.
    pub status: Option<ExitStatus>,
    /// Exit code the wrapper should return.
    pub exit_code: i32,
    /// Final report of each channel, in stdin, stdout, stderr order.
    pub channels: [RelayOutcome; 3],
}

impl RunSummary {
    /// Outcome of the given channel.
    #[must_use]
    pub fn channel(&self, kind: ChannelKind) -> &RelayOutcome {
        match kind {
            ChannelKind::StdinForward => &self.channels[0],
            ChannelKind::StdoutDrain => &self.channels[1],
            ChannelKind::StderrDrain => &self.channels[2],
        }
    }
}

/// Run `invocation` to completion, relaying and logging all three streams.
///
/// # Errors
///
/// Returns `AppError::Spawn` if the child cannot be started. Once the child
/// is running, stream errors close individual channels and never fail the
/// run.
pub async fn run<I, O, E>(
    invocation: &Invocation,
    logs: StreamLogs,
    console: Console<I, O, E>,
    buffer_size: usize,
) -> Result<RunSummary>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let SpawnedChild {
        pid,
        child,
        stdin,
        stdout,
        stderr,
    } = spawn_child(invocation)?;

    let span = info_span!("relay", pid = pid.unwrap_or(0));

    let close_all = CancellationToken::new();
    let observer = monitor_exit(child, close_all.clone());

    let stdin_forward = Channel::new(
        ChannelKind::StdinForward,
        console.stdin,
        stdin,
        logs.stdin,
        buffer_size,
    );
    let stdout_drain = Channel::new(
        ChannelKind::StdoutDrain,
        stdout,
        console.stdout,
        logs.stdout,
        buffer_size,
    );
    let stderr_drain = Channel::new(
        ChannelKind::StderrDrain,
        stderr,
        console.stderr,
        logs.stderr,
        buffer_size,
    );

    let channels = async {
        let (stdin_outcome, stdout_outcome, stderr_outcome) = tokio::join!(
            stdin_forward.run(close_all.clone()),
            stdout_drain.run(close_all.clone()),
            stderr_drain.run(close_all.clone()),
        );
        [stdin_outcome, stdout_outcome, stderr_outcome]
    }
    .instrument(span.clone())
    .await;

    for outcome in &channels {
        info!(
            parent: &span,
            channel = %outcome.channel,
            bytes = outcome.bytes,
            reason = %outcome.reason,
            "channel drained"
        );
    }

    let status = match observer.await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(err)) => {
            warn!(parent: &span, %err, "could not collect child exit status");
            None
        }
        Err(err) => {
            warn!(parent: &span, %err, "exit observer task failed");
            None
        }
    };
    let exit_code = status.map_or(UNKNOWN_EXIT_CODE, process::exit_code);

    info!(parent: &span, exit_code, "run complete");

    Ok(RunSummary {
        pid,
        status,
        exit_code,
        channels,
    })
}
