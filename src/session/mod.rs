//! Log session naming and reservation.
//!
//! A session is the set of four files sharing one name prefix and sequence
//! number: `<prefix>_args_<NNN>`, `<prefix>_stdin_<NNN>`,
//! `<prefix>_stdout_<NNN>` and `<prefix>_stderr_<NNN>`. The sequence number
//! is the lowest `N` whose args file does not exist yet; the args file is
//! then created exclusively so two concurrent runs cannot claim the same `N`.

pub mod writer;

use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{AppError, Result};

pub use writer::{format_args_line, LogFile};

/// Kind of log file within a session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LogKind {
    /// Program path and argument vector.
    Args,
    /// Bytes received on the wrapper's standard input.
    Stdin,
    /// Bytes the child wrote to standard output.
    Stdout,
    /// Bytes the child wrote to standard error.
    Stderr,
}

impl LogKind {
    /// File name component for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Args => "args",
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl Display for LogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the file name for one log of a session.
///
/// The sequence number is zero-padded to at least three digits.
#[must_use]
pub fn log_file_name(prefix: &str, sequence: u32, kind: LogKind) -> String {
    format!("{prefix}_{kind}_{sequence:03}")
}

/// Find the lowest sequence number whose args file does not exist in `dir`.
///
/// The result reflects the file system at call time only; use
/// [`LogSession::reserve`] to claim the number.
#[must_use]
pub fn next_sequence(dir: &Path, prefix: &str) -> u32 {
    next_sequence_from(dir, prefix, 0)
}

fn next_sequence_from(dir: &Path, prefix: &str, start: u32) -> u32 {
    let mut sequence = start;
    while dir
        .join(log_file_name(prefix, sequence, LogKind::Args))
        .exists()
    {
        sequence += 1;
    }
    sequence
}

/// One run's log session: directory, prefix and sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSession {
    dir: PathBuf,
    prefix: String,
    sequence: u32,
}

/// A claimed session whose args file is created but not yet written.
#[derive(Debug)]
pub struct Reservation {
    session: LogSession,
    args_file: File,
}

/// The three stream logs of a session, opened and truncated.
#[derive(Debug)]
pub struct StreamLogs {
    /// Log for the stdin-forward channel.
    pub stdin: LogFile,
    /// Log for the stdout-drain channel.
    pub stdout: LogFile,
    /// Log for the stderr-drain channel.
    pub stderr: LogFile,
}

impl LogSession {
    /// Describe an existing session without touching the file system.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, sequence: u32) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            sequence,
        }
    }

    /// Claim the next free sequence number for `prefix` in `dir`.
    ///
    /// Scans for the first missing args file, then claims it with
    /// [`LogSession::reserve_from`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Log` if the args file cannot be created for any
    /// reason other than it already existing.
    pub fn reserve(dir: impl Into<PathBuf>, prefix: &str) -> Result<Reservation> {
        let dir = dir.into();
        let sequence = next_sequence(&dir, prefix);
        Self::reserve_from(dir, prefix, sequence)
    }

    /// Claim sequence number `start`, or the next free one after it.
    ///
    /// The args file is created with `create_new`. If it already exists,
    /// for example because another process created it after the scan that
    /// produced `start`, the scan resumes from the following number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Log` if the args file cannot be created for any
    /// reason other than it already existing.
    pub fn reserve_from(dir: impl Into<PathBuf>, prefix: &str, start: u32) -> Result<Reservation> {
        let dir = dir.into();
        let mut sequence = start;

        loop {
            let path = dir.join(log_file_name(prefix, sequence, LogKind::Args));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(args_file) => {
                    info!(sequence, path = %path.display(), "log session reserved");
                    return Ok(Reservation {
                        session: Self::new(dir, prefix, sequence),
                        args_file,
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(sequence, "args file already exists, trying next");
                    sequence = next_sequence_from(&dir, prefix, sequence + 1);
                }
                Err(err) => {
                    return Err(AppError::Log(format!(
                        "failed to create {}: {err}",
                        path.display()
                    )));
                }
            }
        }
    }

    /// Directory holding the session's files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name prefix of the session's files.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sequence number of this session.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Full path of the given log.
    #[must_use]
    pub fn path(&self, kind: LogKind) -> PathBuf {
        self.dir.join(log_file_name(&self.prefix, self.sequence, kind))
    }

    /// Create (or truncate) the stdin, stdout and stderr logs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Log` if any of the three files cannot be opened.
    pub fn open_stream_logs(&self) -> Result<StreamLogs> {
        Ok(StreamLogs {
            stdin: LogFile::create(self.path(LogKind::Stdin))?,
            stdout: LogFile::create(self.path(LogKind::Stdout))?,
            stderr: LogFile::create(self.path(LogKind::Stderr))?,
        })
    }
}

impl Reservation {
    /// The claimed session.
    #[must_use]
    pub fn session(&self) -> &LogSession {
        &self.session
    }

    /// Write the args line and close the args file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Log` if the line cannot be written.
    pub fn record_args(self, program: &str, args: &[String]) -> Result<LogSession> {
        let Self {
            session,
            mut args_file,
        } = self;
        writer::write_args_line(&mut args_file, program, args).map_err(|err| {
            AppError::Log(format!(
                "failed to write {}: {err}",
                session.path(LogKind::Args).display()
            ))
        })?;
        Ok(session)
    }
}
