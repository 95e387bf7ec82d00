use std::future::Future;

use crate::error::StressResult;
use crate::migration::command::CommandRunner;
use crate::migration::trigger::MigrationTrigger;
use crate::types::MigrationRequest;
use crate::workers::base::{UnitKind, UnitOfWork};

/// Runs the migration command, holding a worker slot until the command exits.
#[derive(Debug)]
pub struct MigrationUnit<R> {
    trigger: MigrationTrigger<R>,
    request: MigrationRequest,
}

impl<R> MigrationUnit<R>
where
    R: CommandRunner,
{
    pub fn new(trigger: MigrationTrigger<R>, request: MigrationRequest) -> Self {
        Self { trigger, request }
    }
}

impl<R> UnitOfWork for MigrationUnit<R>
where
    R: CommandRunner,
{
    fn kind(&self) -> UnitKind {
        UnitKind::Migration
    }

    fn run(self) -> impl Future<Output = StressResult<()>> + Send + 'static {
        async move { self.trigger.run(&self.request).await.result }
    }
}
