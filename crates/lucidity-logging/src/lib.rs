//! # lucidity-logging
//!
//! Tracing setup for lucidity.
//!
//! Console output always goes to stderr so that stdout carries nothing but
//! command results. An optional log file receives the same events as JSON
//! lines through a non-blocking writer.
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable multi-line output
//! - `JSON` - Structured JSON lines
//! - `Compact` - One line per event

mod format;

pub use format::LogFormat;

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing for the application.
///
/// `RUST_LOG` takes precedence over `level`. When `log_file` is given the
/// returned guard must be held until exit so buffered lines are flushed.
pub fn init_tracing(
    level: &str,
    format: LogFormat,
    log_file: Option<&Path>,
) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(format)];

    let guard = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();

    Ok(guard)
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
    }
}

/// Open (appending) a log file behind a background writer thread.
///
/// Missing parent directories are created.
pub fn file_writer(path: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Log file path has no file name: {}", path.display()),
        )
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
