//! Centralised tracing initialisation for the cleanup binary.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter`, a stderr console layer and an optional
//! append-mode log file.
//!
//! Calling it again is a no-op for the subscriber;
//! only the first global subscriber is installed.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines on both
///   the console and the log file.
/// * `level`: default verbosity when `RUST_LOG` is not set.
/// * `log_file`: when set, every line is also appended to this file
///   (created if missing, never truncated, no ANSI colours).
///
/// Fails only if the log file cannot be opened.
pub fn init_tracing(json: bool, level: Level, log_file: Option<&Path>) -> std::io::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let file = match log_file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    // stdout is reserved for the run summary.
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let console = if json {
        console.json().boxed()
    } else {
        console.boxed()
    };

    let file_layer = file.map(|file| {
        let layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        if json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .ok();

    Ok(())
}
