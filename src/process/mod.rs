//! Child process control.
//!
//! Holds the immutable [`Invocation`] (resolved program path plus
//! arguments) and the mapping from a child's termination status to the
//! wrapper's own exit code. Spawning and exit observation live in
//! [`spawner`].

pub mod spawner;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::{AppError, Result};

/// Exit code used when the child's status cannot be determined.
pub const UNKNOWN_EXIT_CODE: i32 = 1;

/// Program and arguments of the wrapped child, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
}

impl Invocation {
    /// Resolve `program` and capture the argument list.
    ///
    /// See [`resolve_program`] for the lookup rules.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Spawn` if the program cannot be found.
    pub fn resolve(program: &str, args: Vec<String>) -> Result<Self> {
        Ok(Self {
            program: resolve_program(program)?,
            args,
        })
    }

    /// Resolved program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Path passed to the OS at spawn time; see [`command_path`].
    #[must_use]
    pub fn command_path(&self) -> PathBuf {
        command_path(&self.program)
    }

    /// Arguments passed to the program, excluding the program itself.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program path as text, for the args log and diagnostics.
    #[must_use]
    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Resolve a program name to the path recorded in the args log.
///
/// An existing file is used verbatim. Anything else is searched for on
/// `PATH`.
///
/// # Errors
///
/// Returns `AppError::Spawn` if `name` is neither an existing file nor
/// found on `PATH`.
pub fn resolve_program(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    which::which(name)
        .map_err(|err| AppError::Spawn(format!("program `{name}` not found: {err}")))
}

/// Path handed to the OS when spawning `program`.
///
/// A bare relative file name gets a `./` prefix; otherwise the spawn would
/// search `PATH` instead of running the file in the current directory.
#[must_use]
pub fn command_path(program: &Path) -> PathBuf {
    if program.is_relative() && program.components().count() == 1 {
        Path::new(".").join(program)
    } else {
        program.to_path_buf()
    }
}

/// Translate a termination status into the wrapper's exit code.
///
/// A normal exit yields its status code. On Unix a child killed by a signal
/// yields `128 + signal`, matching shell convention.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
