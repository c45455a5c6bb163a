#![forbid(unsafe_code)]

//! `stream-logger`: run a program and log its standard streams.
//!
//! Parses the command line, reserves a log session, records the argument
//! vector, then relays stdin/stdout/stderr on a single-threaded tokio
//! runtime until the child is done. Exits with the child's exit code.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use stream_logger::cli::{self, Cli, LogFormat};
use stream_logger::process::Invocation;
use stream_logger::reactor::{self, Console};
use stream_logger::session::LogSession;
use stream_logger::{AppError, LoggerConfig, Result};

/// Environment variable holding the diagnostic log filter.
const LOG_FILTER_ENV: &str = "STREAM_LOGGER_LOG";

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => return report_parse_error(&err),
    };

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("stream-logger: {err}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("stream-logger: {err}");
            if matches!(err, AppError::Usage(_) | AppError::Config(_)) {
                eprintln!("{}", cli::usage());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> Result<ExitCode> {
    let (program, program_args) = args.program()?;

    let config = match &args.config {
        Some(path) => LoggerConfig::load_from_path(path)?,
        None => LoggerConfig::default(),
    }
    .with_overrides(args.name_prefix.clone(), args.log_dir.clone())?;

    let invocation = Invocation::resolve(program, program_args)?;

    let session = LogSession::reserve(&config.log_dir, &config.name_prefix)?
        .record_args(&invocation.program_display(), invocation.args())?;
    let logs = session.open_stream_logs()?;
    info!(
        sequence = session.sequence(),
        prefix = session.prefix(),
        "log session opened"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Io(format!("failed to build tokio runtime: {err}")))?;

    let summary = runtime.block_on(reactor::run(
        &invocation,
        logs,
        Console::inherited(),
        config.buffer_size,
    ));

    // A console read may still be parked on the blocking pool.
    runtime.shutdown_background();

    let summary = summary?;
    Ok(ExitCode::from(u8::try_from(summary.exit_code).unwrap_or(u8::MAX)))
}

/// Print a clap error and map it to an exit code: 0 for `--help` and
/// `--version`, 1 for anything malformed.
fn report_parse_error(err: &clap::Error) -> ExitCode {
    if let Err(print_err) = err.print() {
        eprintln!("stream-logger: {print_err}");
    }
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Io(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Io(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
