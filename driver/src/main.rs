//! Stress driver binary.
//!
//! Loads the configuration, initializes tracing, then provisions the schema, floods the store
//! with writes, fires the migration command and waits for outstanding work. The process exits
//! with status 0 once the wait is over, even when it timed out or units failed; only setup
//! failures exit with a non-zero status.

use std::process;
use tracing::error;

use config::shared::DriverConfig;
use telemetry::init_tracing;

use crate::configuration::load_driver_config;
use crate::core::start_stress_run_with_config;
use crate::error::{DriverError, DriverResult};

mod configuration;
mod core;
mod error;

fn main() {
    if let Err(err) = run() {
        eprint!("{}", err.render_report());
        process::exit(1);
    }

    process::exit(0);
}

/// Runs the driver, returning once the buffered logs have been flushed.
fn run() -> DriverResult<()> {
    let driver_config = load_driver_config()?;

    let _log_flusher = init_tracing(env!("CARGO_CRATE_NAME")).map_err(DriverError::config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async_main(driver_config));

    // Units abandoned by the drain must not delay the exit.
    runtime.shutdown_background();

    result
}

async fn async_main(driver_config: DriverConfig) -> DriverResult<()> {
    if let Err(err) = start_stress_run_with_config(driver_config).await {
        error!("{err}");
        return Err(err.into());
    }

    Ok(())
}
