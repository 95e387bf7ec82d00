use serde::Deserialize;

use crate::load::Config;
use crate::shared::{MigrationConfig, SchemaConfig, StoreConfig, ValidationError, WorkloadConfig};

/// Top-level configuration of a stress run.
///
/// Loaded once at startup and shared immutably by every component of the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DriverConfig {
    /// Store receiving the schema and the writes.
    pub store: StoreConfig,
    /// Schema provisioned before the workload.
    pub schema: SchemaConfig,
    /// Workload shape and shutdown timeout.
    pub workload: WorkloadConfig,
    /// Administrative repartitioning command.
    pub migration: MigrationConfig,
}

impl DriverConfig {
    /// Validates the whole configuration, including cross-section constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.schema.validate()?;
        self.workload.validate()?;

        if !self.schema.has_column(&self.migration.partition_column) {
            return Err(ValidationError::UnknownPartitionColumn(
                self.migration.partition_column.clone(),
            ));
        }

        Ok(())
    }
}

impl Config for DriverConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["store.endpoints"];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_json(position: u64, workers: u16, partition_column: &str) -> String {
        format!(
            r#"{{
                "store": {{ "kind": "memory" }},
                "schema": {{
                    "keyspace": "testkeyspace",
                    "table": "testcf",
                    "replication_factor": 3,
                    "columns": [
                        {{ "name": "col0", "type": "bigint" }},
                        {{ "name": "col1", "type": "bigint" }},
                        {{ "name": "col2", "type": "varchar" }},
                        {{ "name": "col3", "type": "int" }}
                    ]
                }},
                "workload": {{
                    "row_count": 10,
                    "workers": {workers},
                    "migration_position": {position},
                    "drain_timeout_ms": 1000
                }},
                "migration": {{
                    "store_home": "/opt/cassandra",
                    "tool": "bin/nodetool",
                    "admin_port": 7100,
                    "operation": "morphous",
                    "partition_column": "{partition_column}"
                }}
            }}"#
        )
    }

    fn parse(json: &str) -> DriverConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn valid_configuration_passes() {
        let config = parse(&config_json(5, 2, "col1"));
        assert!(config.validate().is_ok());
        assert_eq!(config.workload.value_offset, 1_000_000);
        assert_eq!(
            config.migration.tool_path(),
            std::path::PathBuf::from("/opt/cassandra/bin/nodetool")
        );
        assert_eq!(config.schema.partition_key().unwrap().name, "col0");
    }

    #[test]
    fn position_equal_to_row_count_is_allowed() {
        let config = parse(&config_json(10, 2, "col1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn position_past_row_count_is_rejected() {
        let config = parse(&config_json(11, 2, "col1"));
        assert_eq!(
            config.validate(),
            Err(ValidationError::MigrationPositionOutOfRange {
                position: 11,
                row_count: 10
            })
        );
    }

    #[test]
    fn zero_workers_are_rejected() {
        let config = parse(&config_json(5, 0, "col1"));
        assert_eq!(config.validate(), Err(ValidationError::WorkersZero));
    }

    #[test]
    fn unknown_partition_column_is_rejected() {
        let config = parse(&config_json(5, 2, "col9"));
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownPartitionColumn("col9".to_string()))
        );
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let mut config = parse(&config_json(5, 2, "col1"));
        config.schema.columns.push(config.schema.columns[0].clone());
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateColumn("col0".to_string()))
        );
    }
}
