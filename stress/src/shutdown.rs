use std::time::Duration;
use tracing::{info, warn};

use crate::workers::pool::{DrainReport, WorkerPool};

/// Bounded wait for outstanding work once submission is over.
///
/// Work still running when the timeout elapses is abandoned, not cancelled: the process is
/// expected to exit right after, taking the remaining units with it.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownSynchronizer {
    timeout: Duration,
}

impl ShutdownSynchronizer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Drains `pool` and logs how the run ended.
    pub async fn wait(&self, pool: &WorkerPool) -> DrainReport {
        info!(timeout_ms = self.timeout.as_millis() as u64, "waiting for outstanding units");

        let report = pool.drain(self.timeout).await;
        let stats = report.stats;

        if report.timed_out {
            warn!(
                outstanding = report.outstanding,
                completed = stats.completed(),
                submitted = stats.submitted,
                "drain timed out, abandoning outstanding units"
            );
        }

        info!(
            submitted = stats.submitted,
            writes_succeeded = stats.writes_succeeded,
            writes_failed = stats.writes_failed,
            migrations_succeeded = stats.migrations_succeeded,
            migrations_failed = stats.migrations_failed,
            peak_concurrency = stats.peak_concurrency,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "drain finished"
        );

        report
    }
}
