use std::sync::Arc;
use tracing::info;

use config::shared::DriverConfig;

use crate::migration::command::CommandRunner;
use crate::migration::trigger::MigrationTrigger;
use crate::store::StoreClient;
use crate::types::{MigrationRequest, WriteTask};
use crate::workers::base::{UnitKind, UnitOfWork};
use crate::workers::migration::MigrationUnit;
use crate::workers::pool::WorkerPool;
use crate::workers::write::WriteUnit;
use crate::workload::sequence::{Submission, SubmissionSequence};

/// Units submitted by [`Coordinator::run`], in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    pub submitted: Vec<UnitKind>,
}

impl SubmissionReport {
    pub fn writes(&self) -> usize {
        self.submitted.iter().filter(|kind| kind.is_write()).count()
    }

    pub fn migrations(&self) -> usize {
        self.submitted.iter().filter(|kind| kind.is_migration()).count()
    }

    /// Returns the index of the write submitted right before the migration, if any.
    pub fn write_before_migration(&self) -> Option<u64> {
        let position = self
            .submitted
            .iter()
            .position(|kind| kind.is_migration())?;

        match self.submitted.get(position.checked_sub(1)?)? {
            UnitKind::Write { index } => Some(*index),
            UnitKind::Migration => None,
        }
    }
}

/// Submits the workload to the pool.
///
/// Submission is sequential and follows the order of the [`SubmissionSequence`]: every write is
/// submitted as its own unit and the migration is submitted once, right after the write at the
/// configured position. There is no barrier between a write and the migration that follows it,
/// both may run concurrently.
#[derive(Debug)]
pub struct Coordinator<C, R> {
    config: Arc<DriverConfig>,
    pool: WorkerPool,
    client: C,
    trigger: MigrationTrigger<R>,
}

impl<C, R> Coordinator<C, R>
where
    C: StoreClient,
    R: CommandRunner,
{
    pub fn new(
        config: Arc<DriverConfig>,
        pool: WorkerPool,
        client: C,
        trigger: MigrationTrigger<R>,
    ) -> Self {
        Self {
            config,
            pool,
            client,
            trigger,
        }
    }

    /// Builds the migration request for the configured table.
    pub fn migration_request(&self) -> MigrationRequest {
        MigrationRequest::new(
            self.config.schema.keyspace.as_str(),
            self.config.schema.table.as_str(),
            self.config.migration.partition_column.as_str(),
        )
    }

    /// Submits every task and the migration, returning once everything has been submitted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<I>(&self, tasks: I) -> SubmissionReport
    where
        I: IntoIterator<Item = WriteTask>,
    {
        let position = self.config.workload.migration_position;
        let sequence =
            SubmissionSequence::new(tasks.into_iter(), position, self.migration_request());

        let mut report = SubmissionReport::default();
        for submission in sequence {
            match submission {
                Submission::Write(task) => {
                    let unit = WriteUnit::new(self.client.clone(), &self.config.schema, task);
                    report.submitted.push(unit.kind());
                    self.pool.submit(unit);
                }
                Submission::Migration(request) => {
                    info!(%request, position, "submitting migration trigger");
                    let unit = MigrationUnit::new(self.trigger.clone(), request);
                    report.submitted.push(unit.kind());
                    self.pool.submit(unit);
                }
            }
        }

        info!(
            writes = report.writes(),
            migrations = report.migrations(),
            "all units submitted"
        );

        report
    }
}
