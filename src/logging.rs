use std::sync::Mutex;

use crate::config::StressConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Guard of the non-blocking file writer; dropping it drains the queue.
static FILE_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout carries only the run markers.
/// File logging is opt-in via `log_dir`; call [`flush_logs`] before exit.
pub fn init_logging(config: &StressConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let registry = tracing_subscriber::registry().with(filter);

    let Some(log_dir) = config.log_dir.as_deref() else {
        registry.with(console_layer()).init();
        return;
    };

    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(log_dir, &config.log_file),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true) // Keep target in JSON for structured queries
            .with_thread_names(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).with(console_layer()).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).with(console_layer()).init();
    }

    if let Ok(mut slot) = FILE_GUARD.lock() {
        *slot = Some(guard);
    }
}

/// Drain pending file log lines to disk.
///
/// Blocks until the writer thread has flushed. Later events are dropped from
/// the file sink, so this is called once on the way out (normal exit or abort).
pub fn flush_logs() {
    let guard = FILE_GUARD.lock().ok().and_then(|mut slot| slot.take());
    drop(guard);
}

fn console_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(false)
}
