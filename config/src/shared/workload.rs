use serde::Deserialize;
use std::time::Duration;

use crate::shared::ValidationError;

const fn default_value_offset() -> i64 {
    1_000_000
}

/// Shape of the write workload and of the shutdown that follows it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkloadConfig {
    /// Number of rows written during the run.
    pub row_count: u64,
    /// Number of concurrent worker slots shared by the writes and the migration trigger.
    pub workers: u16,
    /// Index of the write after whose submission the migration trigger is submitted.
    ///
    /// When equal to [`WorkloadConfig::row_count`] the trigger follows the last write.
    pub migration_position: u64,
    /// How long to wait for outstanding work once every unit has been submitted.
    pub drain_timeout_ms: u64,
    /// Offset between consecutive bigint columns of a generated row.
    #[serde(default = "default_value_offset")]
    pub value_offset: i64,
}

impl WorkloadConfig {
    /// Returns the drain timeout as a [`Duration`].
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Validates the workload settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::WorkersZero);
        }

        if self.migration_position > self.row_count {
            return Err(ValidationError::MigrationPositionOutOfRange {
                position: self.migration_position,
                row_count: self.row_count,
            });
        }

        Ok(())
    }
}
