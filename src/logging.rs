use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with a daily rolling log file. The terminal belongs to
/// the UI, so nothing is written to stdout or stderr.
///
/// Default level: `info,design_studio_lib=debug` (`debug` everywhere when
/// `verbose`), override via RUST_LOG.
/// The returned guard must live until shutdown or buffered lines are lost.
pub fn init(log_dir: &Path, verbose: bool) -> WorkerGuard {
    let default_filter = if verbose { "debug" } else { "info,design_studio_lib=debug" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_appender = tracing_appender::rolling::daily(log_dir, "studio.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, "tracing initialized");
    guard
}
