use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::workers::base::UnitKind;
use crate::workers::outcome::{OutcomeSink, UnitOutcome};

/// How long [`MemoryOutcomeSink::wait_for_outcomes`] waits before failing the test.
const OUTCOME_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sink keeping every outcome in memory, in completion order.
#[derive(Debug, Clone)]
pub struct MemoryOutcomeSink {
    outcomes: Arc<Mutex<Vec<UnitOutcome>>>,
    recorded: Arc<watch::Sender<usize>>,
}

impl MemoryOutcomeSink {
    pub fn new() -> Self {
        let (recorded, _) = watch::channel(0);

        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            recorded: Arc::new(recorded),
        }
    }

    pub fn outcomes(&self) -> Vec<UnitOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the outcome of the write at `index`, if it finished.
    pub fn write_outcome(&self, index: u64) -> Option<UnitOutcome> {
        self.outcomes
            .lock()
            .unwrap()
            .iter()
            .find(|outcome| outcome.kind == UnitKind::Write { index })
            .cloned()
    }

    pub fn migration_outcomes(&self) -> Vec<UnitOutcome> {
        self.outcomes
            .lock()
            .unwrap()
            .iter()
            .filter(|outcome| outcome.kind.is_migration())
            .cloned()
            .collect()
    }

    pub fn failed_writes(&self) -> Vec<u64> {
        let mut indexes: Vec<u64> = self
            .outcomes
            .lock()
            .unwrap()
            .iter()
            .filter_map(|outcome| match outcome.kind {
                UnitKind::Write { index } if !outcome.is_success() => Some(index),
                _ => None,
            })
            .collect();
        indexes.sort_unstable();
        indexes
    }

    /// Waits until at least `count` outcomes were recorded.
    ///
    /// # Panics
    ///
    /// Panics if the outcomes do not arrive within 30 seconds.
    pub async fn wait_for_outcomes(&self, count: usize) {
        let mut recorded = self.recorded.subscribe();
        let reached = matches!(
            tokio::time::timeout(
                OUTCOME_WAIT_TIMEOUT,
                recorded.wait_for(|recorded| *recorded >= count),
            )
            .await,
            Ok(Ok(_))
        );

        if !reached {
            panic!(
                "waited {OUTCOME_WAIT_TIMEOUT:?} for {count} outcomes, only {} were recorded",
                self.len()
            );
        }
    }
}

impl Default for MemoryOutcomeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeSink for MemoryOutcomeSink {
    fn record(&self, outcome: UnitOutcome) {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes.push(outcome);
        self.recorded.send_replace(outcomes.len());
    }
}
