//! Child process spawner and exit observer.
//!
//! Spawns the wrapped program with all three standard handles piped and
//! `kill_on_drop(true)`, so an early error in the wrapper does not leave the
//! child running. The child handle then moves into the exit observer, which
//! is the only place that waits on it.

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Invocation;
use crate::{AppError, Result};

/// A freshly spawned child and its three pipe ends.
#[derive(Debug)]
pub struct SpawnedChild {
    /// OS process id, if the platform reported one.
    pub pid: Option<u32>,
    /// Child process handle; hand it to [`monitor_exit`].
    pub child: Child,
    /// Write end of the child's stdin pipe.
    pub stdin: ChildStdin,
    /// Read end of the child's stdout pipe.
    pub stdout: ChildStdout,
    /// Read end of the child's stderr pipe.
    pub stderr: ChildStderr,
}

/// Spawn the invocation with piped stdin, stdout and stderr.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns `AppError::Spawn` if the OS refuses to start the program or a
/// pipe end was not created.
pub fn spawn_child(invocation: &Invocation) -> Result<SpawnedChild> {
    let mut cmd = Command::new(invocation.command_path());
    cmd.args(invocation.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|err| {
        AppError::Spawn(format!(
            "failed to spawn {}: {err}",
            invocation.program().display()
        ))
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture child stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture child stdout".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture child stderr".into()))?;

    let pid = child.id();
    info!(
        pid = pid.unwrap_or(0),
        program = %invocation.program().display(),
        args = invocation.args().len(),
        "child process spawned"
    );

    Ok(SpawnedChild {
        pid,
        child,
        stdin,
        stdout,
        stderr,
    })
}

/// Spawn the exit observer for `child`.
///
/// The task waits for the child exactly once, then cancels `close_all` so
/// every relay channel winds down. The termination status is delivered
/// through the returned [`JoinHandle`]; awaiting it is the wrapper's final
/// wait on the child.
#[must_use]
pub fn monitor_exit(
    mut child: Child,
    close_all: CancellationToken,
) -> JoinHandle<io::Result<ExitStatus>> {
    tokio::spawn(async move {
        let result = child.wait().await;

        match &result {
            Ok(status) => info!(%status, "child process exited"),
            Err(err) => warn!(%err, "error waiting for child process"),
        }

        close_all.cancel();
        result
    })
}
