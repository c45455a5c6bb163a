//! Command-line surface.
//!
//! `stream-logger [OPTIONS] -- PROGRAM [ARG...]`. Everything after the
//! first bare `--` is taken literally as the program and its arguments.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

use crate::{AppError, Result};

/// Diagnostic log output format.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Parsed command line.
#[derive(Debug, Parser)]
#[command(
    name = "stream-logger",
    about = "Run and log process.",
    override_usage = "stream-logger [OPTIONS] -- PROGRAM [ARG ...]",
    version,
    long_about = None
)]
pub struct Cli {
    /// Output name prefix [default: log].
    #[arg(long = "name_prefix", value_name = "PREFIX")]
    pub name_prefix: Option<String>,

    /// Directory the log files are written to [default: current directory].
    #[arg(long = "log_dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// TOML file with defaults for `name_prefix`, `log_dir` and `buffer_size`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Diagnostic output format (text or json).
    #[arg(long = "log_format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Program to run, followed by its arguments.
    #[arg(last = true, value_name = "PROGRAM")]
    pub command: Vec<String>,
}

impl Cli {
    /// Split the trailing operands into the program and its arguments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Usage` if nothing follows `--`.
    pub fn program(&self) -> Result<(&str, Vec<String>)> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| AppError::Usage("no program given after `--`".into()))?;
        Ok((program.as_str(), args.to_vec()))
    }
}

/// Rendered usage line, printed alongside startup errors.
#[must_use]
pub fn usage() -> String {
    Cli::command().render_usage().to_string()
}
