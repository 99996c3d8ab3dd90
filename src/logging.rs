//! Structured logging setup.
//!
//! Two layers: a daily-rolling file in `{data_dir}/logs` (latest 5 files
//! kept) and a human-readable console layer on stderr. stdout is reserved
//! for protocol events and must never receive log output.

use std::fs;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::paths::get_data_dir;

/// Initialize the logging system.
///
/// Respects `RUST_LOG`, defaulting to `info` with noisy HTTP internals
/// damped. Falls back to console-only logging when the log directory
/// cannot be created.
pub fn init() {
    let log_dir = get_data_dir().join("logs");
    let _ = fs::create_dir_all(&log_dir);

    // Environment filter: RUST_LOG env var, defaulting to info.
    // reqwest/hyper/mio spam debug-level request internals.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,mio=warn"));

    // The fmt layer is generic over the subscriber type, so each match arm
    // below needs its own instantiation; this macro expands it in place.
    macro_rules! console_layer {
        () => {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true)
                .compact()
        };
    }

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("voiceflow")
        .filename_suffix("log")
        .max_log_files(5)
        .build(&log_dir);

    match file_appender {
        Ok(appender) => {
            let file_layer = fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(console_layer!())
                .init();
            tracing::info!(log_dir = %log_dir.display(), "Logger initialized");
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer!())
                .init();
            tracing::warn!("File logging unavailable ({}), using stderr only", e);
        }
    }
}
