//! Unit tests for the relay channel loop.
//!
//! Sources and sinks are in-memory (`&[u8]`, `tokio::io::duplex`) so each
//! close path can be driven deterministically without a child process.
//!
//! # Scenarios covered
//!
//! | Scenario | Expected close reason |
//! |----------|-----------------------|
//! | Source reaches EOF | `Eof`, all bytes in sink and log |
//! | Buffer smaller than input | `Eof`, order preserved |
//! | Close-all with idle source | `Shutdown`, nothing relayed |
//! | Close-all with readable bytes | bytes relayed first, then `Eof` |
//! | Stdin sink peer gone | `SinkError`, chunk still logged |
//! | Console sink gone on a drain | keeps logging until `Eof` |
//! | Source read fails | `SourceError` |

use std::fs;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::sync::CancellationToken;

use stream_logger::relay::{Channel, ChannelKind, CloseReason};
use stream_logger::session::LogFile;

/// Reader that fails on every poll.
struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("device unplugged")))
    }
}

fn log_in(dir: &tempfile::TempDir, name: &str) -> LogFile {
    LogFile::create(dir.path().join(name)).expect("create log")
}

#[tokio::test]
async fn eof_relays_everything_to_sink_and_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (sink, mut sink_reader) = tokio::io::duplex(1024);

    let channel = Channel::new(
        ChannelKind::StdoutDrain,
        &b"hello world"[..],
        sink,
        log_in(&temp, "out"),
        4096,
    );
    assert_eq!(channel.kind(), ChannelKind::StdoutDrain);
    let outcome = channel.run(CancellationToken::new()).await;

    assert_eq!(outcome.channel, ChannelKind::StdoutDrain);
    assert_eq!(outcome.reason, CloseReason::Eof);
    assert_eq!(outcome.bytes, 11);

    let mut forwarded = Vec::new();
    sink_reader
        .read_to_end(&mut forwarded)
        .await
        .expect("sink closed after channel close");
    assert_eq!(forwarded, b"hello world");
    assert_eq!(fs::read(temp.path().join("out")).expect("read log"), b"hello world");
}

#[tokio::test]
async fn small_buffer_preserves_byte_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input: Vec<u8> = (0..10_000u32)
        .map(|i| u8::try_from(i % 251).unwrap())
        .collect();
    let (sink, mut sink_reader) = tokio::io::duplex(256);

    let channel = Channel::new(
        ChannelKind::StdinForward,
        &input[..],
        sink,
        log_in(&temp, "in"),
        7,
    );

    let mut forwarded = Vec::new();
    let (outcome, read) = tokio::join!(
        channel.run(CancellationToken::new()),
        sink_reader.read_to_end(&mut forwarded),
    );
    read.expect("read sink");

    assert_eq!(outcome.reason, CloseReason::Eof);
    assert_eq!(outcome.bytes, 10_000);
    assert_eq!(forwarded, input);
    assert_eq!(fs::read(temp.path().join("in")).expect("read log"), input);
}

#[tokio::test]
async fn close_all_stops_idle_channel() {
    let temp = tempfile::tempdir().expect("tempdir");
    // Keep the writer half alive so the source never reaches EOF.
    let (_source_writer, source) = tokio::io::duplex(64);
    let (sink, _sink_reader) = tokio::io::duplex(64);

    let close_all = CancellationToken::new();
    close_all.cancel();

    let channel = Channel::new(
        ChannelKind::StdinForward,
        source,
        sink,
        log_in(&temp, "in"),
        4096,
    );
    let outcome = channel.run(close_all).await;

    assert_eq!(outcome.reason, CloseReason::Shutdown);
    assert_eq!(outcome.bytes, 0);
    assert_eq!(fs::read(temp.path().join("in")).expect("read log"), b"");
}

#[tokio::test]
async fn close_all_drains_bytes_already_readable() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (sink, mut sink_reader) = tokio::io::duplex(1024);

    let close_all = CancellationToken::new();
    close_all.cancel();

    let channel = Channel::new(
        ChannelKind::StderrDrain,
        &b"last words"[..],
        sink,
        log_in(&temp, "err"),
        4,
    );
    let outcome = channel.run(close_all).await;

    assert_eq!(outcome.bytes, 10);
    assert_eq!(outcome.reason, CloseReason::Eof);

    let mut forwarded = Vec::new();
    sink_reader.read_to_end(&mut forwarded).await.expect("read");
    assert_eq!(forwarded, b"last words");
}

#[tokio::test]
async fn close_all_after_start_wakes_blocked_read() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (_source_writer, source) = tokio::io::duplex(64);
    let (sink, _sink_reader) = tokio::io::duplex(64);
    let close_all = CancellationToken::new();

    let channel = Channel::new(
        ChannelKind::StdoutDrain,
        source,
        sink,
        log_in(&temp, "out"),
        4096,
    );

    let trigger = close_all.clone();
    let (outcome, ()) = tokio::join!(channel.run(close_all), async move {
        tokio::task::yield_now().await;
        trigger.cancel();
    });

    assert_eq!(outcome.reason, CloseReason::Shutdown);
}

#[tokio::test]
async fn sink_failure_closes_channel_after_logging_chunk() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (sink, sink_reader) = tokio::io::duplex(64);
    drop(sink_reader);

    let channel = Channel::new(
        ChannelKind::StdinForward,
        &b"to a closed pipe"[..],
        sink,
        log_in(&temp, "in"),
        4096,
    );
    let outcome = channel.run(CancellationToken::new()).await;

    assert!(
        matches!(outcome.reason, CloseReason::SinkError(_)),
        "got {:?}",
        outcome.reason
    );
    assert_eq!(outcome.bytes, 16);
    assert_eq!(outcome.sink_error, None);
    assert_eq!(
        fs::read(temp.path().join("in")).expect("read log"),
        b"to a closed pipe",
        "log is written before the sink"
    );
}

#[tokio::test]
async fn drain_keeps_logging_after_console_sink_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input: Vec<u8> = b"0123456789".repeat(500);
    let (sink, sink_reader) = tokio::io::duplex(64);
    drop(sink_reader);

    let channel = Channel::new(
        ChannelKind::StdoutDrain,
        &input[..],
        sink,
        log_in(&temp, "out"),
        16,
    );
    let outcome = channel.run(CancellationToken::new()).await;

    assert_eq!(outcome.reason, CloseReason::Eof);
    assert_eq!(outcome.bytes, 5000);
    assert!(outcome.sink_error.is_some(), "console failure is reported");
    assert_eq!(fs::read(temp.path().join("out")).expect("read log"), input);
}

#[tokio::test]
async fn source_failure_closes_channel() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (sink, _sink_reader) = tokio::io::duplex(64);

    let channel = Channel::new(
        ChannelKind::StdoutDrain,
        FailingReader,
        sink,
        log_in(&temp, "out"),
        4096,
    );
    let outcome = channel.run(CancellationToken::new()).await;

    match outcome.reason {
        CloseReason::SourceError(msg) => assert!(msg.contains("device unplugged")),
        other => panic!("expected SourceError, got {other:?}"),
    }
}

#[test]
fn close_reason_display_is_short() {
    assert_eq!(CloseReason::Eof.to_string(), "eof");
    assert_eq!(CloseReason::Shutdown.to_string(), "shutdown");
    assert_eq!(
        CloseReason::SinkError("broken pipe".into()).to_string(),
        "sink error: broken pipe"
    );
}

#[test]
fn channel_kind_names() {
    assert_eq!(ChannelKind::StdinForward.to_string(), "stdin");
    assert_eq!(ChannelKind::StdoutDrain.to_string(), "stdout");
    assert_eq!(ChannelKind::StderrDrain.to_string(), "stderr");
}

#[test]
fn only_stdin_forward_closes_on_sink_error() {
    assert!(ChannelKind::StdinForward.closes_on_sink_error());
    assert!(!ChannelKind::StdoutDrain.closes_on_sink_error());
    assert!(!ChannelKind::StderrDrain.closes_on_sink_error());
}
