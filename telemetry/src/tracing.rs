use std::io;
use std::sync::Once;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable enabling log output in tests.
const ENABLE_TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("invalid log filter directives: {0}")]
    Filter(#[from] ParseError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the non-blocking log writer alive.
///
/// Buffered log lines are flushed when this value is dropped, so it must be dropped before the
/// process exits through [`std::process::exit`], which skips destructors.
#[must_use = "dropping the flusher immediately discards buffered log lines"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for a binary.
///
/// Log lines go to stdout through a non-blocking writer. The filter is read from `RUST_LOG`
/// and defaults to `info` for `app_name` and the core library. Records emitted through the
/// `log` facade, such as those of the store driver, are forwarded to the subscriber.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let (writer, guard) = tracing_appender::non_blocking(io::stdout());

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{app_name}=info,stress=info"))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_target(true))
        .try_init()?;

    Ok(LogFlusher { _guard: guard })
}

/// Installs a subscriber for tests, at most once per process.
///
/// Nothing is installed unless `ENABLE_TRACING` is set, which keeps test output quiet by default.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TEST_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        // Another test harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
