//! Tracing setup for the `neptune` binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, else `fallback`, else `info`.
pub fn resolve_filter(env: Option<&str>, fallback: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Warnings-and-above layer writing to stderr.
fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN)
}

/// Installs a daily rolling file log in `logs_dir` plus warnings on stderr.
///
/// Returns the guard that flushes the file writer; keep it alive until exit.
/// When the log directory cannot be created only stderr logging is set up.
pub fn init(logs_dir: &Path, level: &str) -> Option<WorkerGuard> {
    let filter = resolve_filter(std::env::var("RUST_LOG").ok().as_deref(), level);
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        tracing_subscriber::registry().with(filter).with(stderr_layer()).init();
        tracing::warn!(path = %logs_dir.display(), error = %e, "File logging disabled");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, "neptune.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(stderr_layer())
        .init();

    Some(guard)
}
