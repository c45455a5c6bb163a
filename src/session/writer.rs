//! Raw byte log files and the args line format.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{AppError, Result};

/// Append-only raw byte log owned by one relay channel.
///
/// Every append is flushed before it returns so the log never lags the
/// bytes that were forwarded.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Create `path`, truncating any previous content.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Log` if the file cannot be opened for writing.
    pub fn create(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| AppError::Log(format!("failed to open {}: {e}", path.display())))?;
        Ok(Self { path, file })
    }

    /// Append `bytes` verbatim and flush.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the write or flush fails.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    /// Location of this log on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Format the args log line.
///
/// Each token is wrapped in single quotes and followed by one space,
/// including the last. Embedded quotes are not escaped.
#[must_use]
pub fn format_args_line(program: &str, args: &[String]) -> String {
    let mut line = String::new();
    for token in std::iter::once(program).chain(args.iter().map(String::as_str)) {
        line.push('\'');
        line.push_str(token);
        line.push_str("' ");
    }
    line
}

pub(crate) fn write_args_line<W: Write>(
    out: &mut W,
    program: &str,
    args: &[String],
) -> io::Result<()> {
    out.write_all(format_args_line(program, args).as_bytes())?;
    out.flush()
}
