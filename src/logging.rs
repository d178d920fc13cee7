// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initializes the global `tracing` subscriber. Must be called exactly once,
/// before any component runs - logging is ambient infrastructure, never a
/// construction-time dependency passed around like config is (there is
/// nothing component-specific to inject).
///
/// Returns the `tracing_appender` worker guard; the caller must keep it
/// alive for the process lifetime or buffered file log lines can be lost.
pub fn init(
    verbose: bool,
    no_console: bool,
    timestamps: bool,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = || EnvFilter::new(format!("dynquee={level}"));

    let console_layer = (!no_console).then(|| build_console_layer(timestamps).with_filter(filter()));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let _ = std::fs::create_dir_all(dir);
            let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("dynquee.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console_layer).with(file_layer).init();

    guard
}

fn build_console_layer(
    timestamps: bool,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync + 'static> {
    let layer = tracing_subscriber::fmt::layer().with_target(false);
    if timestamps {
        Box::new(layer)
    } else {
        Box::new(layer.without_time())
    }
}
