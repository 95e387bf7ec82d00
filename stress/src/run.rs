//! Lifecycle of a single stress run.
//!
//! A run moves through [`RunPhase::Idle`], [`RunPhase::Provisioning`], [`RunPhase::Submitting`],
//! [`RunPhase::Draining`] and [`RunPhase::Terminated`], in this order and never back. The current
//! phase is published on a watch channel so that observers can follow the run.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use config::shared::DriverConfig;

use crate::coordinator::{Coordinator, SubmissionReport};
use crate::error::StressResult;
use crate::migration::command::CommandRunner;
use crate::migration::trigger::MigrationTrigger;
use crate::provision::provision_schema;
use crate::shutdown::ShutdownSynchronizer;
use crate::store::StoreClient;
use crate::workers::outcome::{OutcomeSink, TracingOutcomeSink};
use crate::workers::pool::{DrainReport, WorkerPool};
use crate::workload::generator::{ColumnSynthesizer, RowSynthesizer, TaskGenerator};

/// Phase of a stress run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Idle,
    Provisioning,
    Submitting,
    Draining,
    Terminated,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Provisioning => "provisioning",
            RunPhase::Submitting => "submitting",
            RunPhase::Draining => "draining",
            RunPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Transmitter side of the run phase channel.
pub type RunPhaseTx = watch::Sender<RunPhase>;

/// Receiver side of the run phase channel.
pub type RunPhaseRx = watch::Receiver<RunPhase>;

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub submission: SubmissionReport,
    pub drain: DrainReport,
}

/// A single stress run against a store.
///
/// The run is consumed by [`StressRun::run`], so a run cannot be started twice.
pub struct StressRun<C, R> {
    run_id: Uuid,
    config: Arc<DriverConfig>,
    client: C,
    runner: R,
    sink: Arc<dyn OutcomeSink>,
    phase_tx: RunPhaseTx,
}

impl<C, R> StressRun<C, R>
where
    C: StoreClient,
    R: CommandRunner,
{
    /// Creates a run whose outcomes are logged.
    pub fn new(config: Arc<DriverConfig>, client: C, runner: R) -> Self {
        let (phase_tx, _) = watch::channel(RunPhase::Idle);

        Self {
            run_id: Uuid::new_v4(),
            config,
            client,
            runner,
            sink: Arc::new(TracingOutcomeSink),
            phase_tx,
        }
    }

    /// Delivers unit outcomes to `sink` instead of the logs.
    pub fn with_outcome_sink<S>(mut self, sink: S) -> Self
    where
        S: OutcomeSink,
    {
        self.sink = Arc::new(sink);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Subscribes to the phase changes of the run.
    pub fn subscribe(&self) -> RunPhaseRx {
        self.phase_tx.subscribe()
    }

    /// Runs the workload with rows generated from the table's column types.
    pub async fn run(self) -> StressResult<RunSummary> {
        let synthesizer =
            ColumnSynthesizer::new(&self.config.schema, self.config.workload.value_offset);
        self.run_with(synthesizer).await
    }

    /// Runs the workload with rows produced by `synthesizer`.
    ///
    /// Only the provisioning of the schema and the creation of the pool can fail. Failures of
    /// individual writes or of the migration are reported as outcomes.
    pub async fn run_with<S>(self, synthesizer: S) -> StressResult<RunSummary>
    where
        S: RowSynthesizer,
    {
        let span = info_span!(
            "stress_run",
            run_id = %self.run_id,
            store = C::name(),
            keyspace = %self.config.schema.keyspace,
            table = %self.config.schema.table,
        );

        self.run_phases(synthesizer).instrument(span).await
    }

    async fn run_phases<S>(self, synthesizer: S) -> StressResult<RunSummary>
    where
        S: RowSynthesizer,
    {
        let StressRun {
            run_id,
            config,
            client,
            runner,
            sink,
            phase_tx,
        } = self;
        let workload = &config.workload;

        info!(
            row_count = workload.row_count,
            workers = workload.workers,
            migration_position = workload.migration_position,
            "starting stress run"
        );

        transition(&phase_tx, RunPhase::Provisioning);
        provision_schema(&client, &config.schema).await?;

        transition(&phase_tx, RunPhase::Submitting);
        let pool = WorkerPool::new(usize::from(workload.workers), sink)?;
        let trigger = MigrationTrigger::new(runner, config.migration.clone());
        let coordinator = Coordinator::new(Arc::clone(&config), pool.clone(), client, trigger);
        let submission = coordinator.run(TaskGenerator::new(workload.row_count, synthesizer));

        transition(&phase_tx, RunPhase::Draining);
        let drain = ShutdownSynchronizer::new(workload.drain_timeout())
            .wait(&pool)
            .await;

        transition(&phase_tx, RunPhase::Terminated);

        Ok(RunSummary {
            run_id,
            submission,
            drain,
        })
    }
}

fn transition(phase_tx: &RunPhaseTx, phase: RunPhase) {
    let previous = phase_tx.send_replace(phase);
    info!(from = %previous, to = %phase, "run phase changed");
}

impl<C, R> fmt::Debug for StressRun<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StressRun")
            .field("run_id", &self.run_id)
            .field("phase", &*self.phase_tx.borrow())
            .finish()
    }
}
