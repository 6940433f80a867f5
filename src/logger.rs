use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Third-party crates capped at `warn` regardless of the base level.
const QUIET_CRATES: &str = "reqwest=warn,hyper=warn,hyper_util=warn,symphonia=warn,rodio=warn";

/// Initialize structured logging.
///
/// Sets up:
/// - Console output on stderr (stdout carries audio in streaming mode),
///   compact, defaulting to `warn`.
/// - File output: daily rolling `speak.*.log` files in `log_dir`, keeping the
///   latest 5, defaulting to `info`.
/// - `RUST_LOG` replaces both defaults when set.
///
/// If the log directory cannot be created the file layer is skipped.
/// Calling this twice is harmless: the second subscriber is discarded.
pub fn init(log_dir: &Path) {
    let appender = file_appender(log_dir);

    let file_layer = appender.map(|appender| {
        fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter("info"))
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter("warn"));

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    tracing::debug!(log_dir = %log_dir.display(), "Logger initialized");
}

/// Daily rolling appender in `log_dir`, or `None` when the directory
/// cannot be created or opened.
fn file_appender(log_dir: &Path) -> Option<RollingFileAppender> {
    fs::create_dir_all(log_dir).ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("speak")
        .filename_suffix("log")
        .max_log_files(5)
        .build(log_dir)
        .ok()
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", default_level, QUIET_CRATES)))
}
