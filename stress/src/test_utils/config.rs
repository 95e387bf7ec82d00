use std::path::PathBuf;
use std::time::Duration;

use config::shared::{
    ColumnConfig, ColumnType, DriverConfig, MigrationConfig, SchemaConfig, StoreConfig,
    WorkloadConfig,
};

/// Builder of driver configurations targeting the in-memory store.
///
/// Defaults to the table used by the driver in production, 10 rows, 2 workers, the migration
/// after write 5 and a 10 second drain timeout.
#[derive(Debug, Clone)]
pub struct TestDriverConfigBuilder {
    keyspace: String,
    table: String,
    row_count: u64,
    workers: u16,
    migration_position: u64,
    drain_timeout: Duration,
}

impl TestDriverConfigBuilder {
    pub fn new() -> Self {
        Self {
            keyspace: "testkeyspace".to_string(),
            table: "testcf".to_string(),
            row_count: 10,
            workers: 2,
            migration_position: 5,
            drain_timeout: Duration::from_secs(10),
        }
    }

    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = keyspace.to_string();
        self
    }

    pub fn row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn workers(mut self, workers: u16) -> Self {
        self.workers = workers;
        self
    }

    pub fn migration_position(mut self, migration_position: u64) -> Self {
        self.migration_position = migration_position;
        self
    }

    pub fn drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn build(self) -> DriverConfig {
        DriverConfig {
            store: StoreConfig::Memory,
            schema: test_schema(&self.keyspace, &self.table),
            workload: WorkloadConfig {
                row_count: self.row_count,
                workers: self.workers,
                migration_position: self.migration_position,
                drain_timeout_ms: self.drain_timeout.as_millis() as u64,
                value_offset: 1_000_000,
            },
            migration: MigrationConfig {
                store_home: PathBuf::from("/opt/cassandra"),
                tool: PathBuf::from("bin/nodetool"),
                admin_port: 7100,
                operation: "morphous".to_string(),
                partition_column: "col1".to_string(),
            },
        }
    }
}

impl Default for TestDriverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the four column table written by the driver: two bigints, a varchar and an int.
pub fn test_schema(keyspace: &str, table: &str) -> SchemaConfig {
    let column = |name: &str, column_type| ColumnConfig {
        name: name.to_string(),
        column_type,
    };

    SchemaConfig {
        keyspace: keyspace.to_string(),
        table: table.to_string(),
        replication_factor: 3,
        columns: vec![
            column("col0", ColumnType::BigInt),
            column("col1", ColumnType::BigInt),
            column("col2", ColumnType::Varchar),
            column("col3", ColumnType::Int),
        ],
    }
}
