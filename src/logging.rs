use std::path::Path;

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};


/// Keeps the non-blocking file writer alive. Drop it only right before exiting,
/// otherwise buffered log lines may be lost.
#[must_use = "dropping the guard stops the file logger"]
pub struct LoggingGuard {
    _file_writer_guard: Option<WorkerGuard>,
}


/// Parse a log filter directive (e.g. `info` or `brokerpak_config=debug,warn`).
pub fn parse_log_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .into_diagnostic()
        .wrap_err_with(|| miette!("Invalid log filter: {directive:?}."))
}


/// Install the global tracing subscriber: a console layer on standard error and, if
/// `log_file_output_directory` is specified, a second layer writing to `log_file_name` in it.
pub fn initialize_tracing(
    console_level_filter: EnvFilter,
    log_file_level_filter: EnvFilter,
    log_file_output_directory: Option<&Path>,
    log_file_name: &str,
) -> Result<LoggingGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level_filter);

    let (file_layer, file_writer_guard) = match log_file_output_directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to create missing log directory at {}.",
                        directory.display()
                    )
                })?;

            let file_appender = tracing_appender::rolling::never(directory, log_file_name);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking_writer)
                .with_ansi(false)
                .with_filter(log_file_level_filter);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install global tracing subscriber.")?;

    Ok(LoggingGuard {
        _file_writer_guard: file_writer_guard,
    })
}
