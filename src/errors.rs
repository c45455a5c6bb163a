//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all startup and run failures.
///
/// Steady-state stream errors are not represented here: a relay that hits
/// EOF or an I/O error closes its own channel and reports a
/// [`CloseReason`](crate::relay::CloseReason) instead.
#[derive(Debug)]
pub enum AppError {
    /// Configuration file parsing or validation failure.
    Config(String),
    /// Malformed command line or missing program operand.
    Usage(String),
    /// Program resolution or process spawn failure.
    Spawn(String),
    /// Log session reservation or log file open/write failure.
    Log(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Usage(msg) => write!(f, "usage: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Log(msg) => write!(f, "log: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
