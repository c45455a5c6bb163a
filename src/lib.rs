#![forbid(unsafe_code)]

//! Run a program and tee its standard streams to numbered log files.

pub mod cli;
pub mod config;
pub mod errors;
pub mod process;
pub mod reactor;
pub mod relay;
pub mod session;

pub use config::LoggerConfig;
pub use errors::{AppError, Result};
