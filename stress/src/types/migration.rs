use std::fmt;

/// Request to repartition a table on a different column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub keyspace: String,
    pub table: String,
    pub partition_column: String,
}

impl MigrationRequest {
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        partition_column: impl Into<String>,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            partition_column: partition_column.into(),
        }
    }
}

impl fmt::Display for MigrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} on {}",
            self.keyspace, self.table, self.partition_column
        )
    }
}
