use std::sync::Arc;
use tracing::{error, info};

use config::shared::MigrationConfig;

use crate::migration::command::{CommandInvocation, CommandRunner, CommandSpec};
use crate::types::MigrationRequest;

/// Starts the repartitioning of a table through the store's administrative tool.
///
/// The command runs to completion: the caller is suspended until the process exits, which is
/// how the trigger holds a worker slot for the whole duration of the operation. Failures are
/// logged with the captured output and returned, they are never retried.
#[derive(Debug)]
pub struct MigrationTrigger<R> {
    runner: Arc<R>,
    config: MigrationConfig,
}

impl<R> MigrationTrigger<R>
where
    R: CommandRunner,
{
    pub fn new(runner: R, config: MigrationConfig) -> Self {
        Self {
            runner: Arc::new(runner),
            config,
        }
    }

    /// Builds the administrative command line for `request`.
    ///
    /// The partition column is passed as a JSON descriptor, for example `{"column":"col1"}`.
    pub fn command_spec(&self, request: &MigrationRequest) -> CommandSpec {
        let descriptor = serde_json::json!({ "column": request.partition_column }).to_string();

        CommandSpec::new(self.config.tool_path())
            .arg("-p")
            .arg(self.config.admin_port.to_string())
            .arg("-m")
            .arg(descriptor)
            .arg(self.config.operation.as_str())
            .arg(request.keyspace.as_str())
            .arg(request.table.as_str())
    }

    /// Runs the command for `request` and waits for it to exit.
    pub async fn run(&self, request: &MigrationRequest) -> CommandInvocation {
        let spec = self.command_spec(request);
        info!(command = %spec, "starting migration command");

        let invocation = self.runner.invoke(&spec).await;
        match &invocation.result {
            Ok(()) => info!(
                %request,
                output = %invocation.output,
                "migration command ended"
            ),
            Err(err) => error!(
                %request,
                error = %err,
                output = %invocation.output,
                "migration command failed"
            ),
        }

        invocation
    }
}

impl<R> Clone for MigrationTrigger<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            config: self.config.clone(),
        }
    }
}
