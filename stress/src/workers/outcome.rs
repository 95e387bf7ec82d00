use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::StressResult;
use crate::workers::base::UnitKind;

/// How a unit of work ended.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub kind: UnitKind,
    /// Time spent running, excluding the wait for a free slot.
    pub elapsed: Duration,
    pub result: StressResult<()>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives the outcome of every unit executed by the pool.
///
/// Outcomes are recorded from the worker tasks, concurrently and in completion order.
pub trait OutcomeSink: Send + Sync + 'static {
    fn record(&self, outcome: UnitOutcome);
}

/// Sink logging every outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutcomeSink;

impl OutcomeSink for TracingOutcomeSink {
    fn record(&self, outcome: UnitOutcome) {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match (&outcome.kind, &outcome.result) {
            (UnitKind::Write { index }, Ok(())) => {
                debug!(index, elapsed_ms, "write completed");
            }
            (UnitKind::Migration, Ok(())) => {
                info!(elapsed_ms, "migration completed");
            }
            (kind, Err(err)) => {
                warn!(unit = %kind, elapsed_ms, error = %err, "unit of work failed");
            }
        }
    }
}

impl<S> OutcomeSink for Arc<S>
where
    S: OutcomeSink + ?Sized,
{
    fn record(&self, outcome: UnitOutcome) {
        (**self).record(outcome);
    }
}
