use std::sync::Arc;
use tracing::{debug, info};

use config::shared::{DriverConfig, StoreConfig};
use stress::error::StressResult;
use stress::migration::command::{CommandRunner, DryRunCommandRunner, ProcessCommandRunner};
use stress::run::{RunSummary, StressRun};
use stress::store::StoreClient;
use stress::store::memory::MemoryStoreClient;
use stress::store::postgres::PgStoreClient;

/// Connects to the configured store and runs the workload against it.
///
/// The store client is dispatched statically, one branch per store kind. Runs against the
/// in-memory store are dry runs: the migration command is logged but never started.
pub async fn start_stress_run_with_config(driver_config: DriverConfig) -> StressResult<RunSummary> {
    info!("starting stress driver");

    log_config(&driver_config);

    let driver_config = Arc::new(driver_config);
    match &driver_config.store {
        StoreConfig::Memory => {
            let client = MemoryStoreClient::new();
            run_against(Arc::clone(&driver_config), client, DryRunCommandRunner).await
        }
        StoreConfig::Postgres(connection) => {
            let client = PgStoreClient::connect(connection).await?;
            run_against(Arc::clone(&driver_config), client, ProcessCommandRunner).await
        }
    }
}

async fn run_against<C, R>(
    driver_config: Arc<DriverConfig>,
    client: C,
    runner: R,
) -> StressResult<RunSummary>
where
    C: StoreClient,
    R: CommandRunner,
{
    let run = StressRun::new(driver_config, client, runner);
    let summary = run.run().await?;

    let stats = summary.drain.stats;
    info!(
        run_id = %summary.run_id,
        writes_submitted = summary.submission.writes(),
        completed = stats.completed(),
        failed = stats.failed(),
        outstanding = summary.drain.outstanding,
        timed_out = summary.drain.timed_out,
        "stress run finished"
    );

    Ok(summary)
}

fn log_config(config: &DriverConfig) {
    log_store_config(&config.store);

    let schema = &config.schema;
    debug!(
        keyspace = %schema.keyspace,
        table = %schema.table,
        replication_factor = schema.replication_factor,
        columns = schema.columns.len(),
        "using schema config"
    );

    let workload = &config.workload;
    debug!(
        row_count = workload.row_count,
        workers = workload.workers,
        migration_position = workload.migration_position,
        drain_timeout_ms = workload.drain_timeout_ms,
        "using workload config"
    );

    let migration = &config.migration;
    debug!(
        tool = %migration.tool_path().display(),
        admin_port = migration.admin_port,
        operation = %migration.operation,
        partition_column = %migration.partition_column,
        "using migration config"
    );
}

fn log_store_config(config: &StoreConfig) {
    match config {
        StoreConfig::Memory => {
            debug!("using memory store config");
        }
        StoreConfig::Postgres(connection) => {
            debug!(
                endpoints = ?connection.endpoints,
                port = connection.port,
                name = %connection.name,
                username = %connection.username,
                compression = connection.compression,
                "using postgres store config"
            );
        }
    }
}
