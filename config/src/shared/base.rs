use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The worker pool needs at least one slot.
    #[error("`workload.workers` cannot be zero")]
    WorkersZero,
    /// The migration trigger must be spliced inside the submission sequence.
    #[error(
        "`workload.migration_position` ({position}) cannot be greater than `workload.row_count` ({row_count})"
    )]
    MigrationPositionOutOfRange { position: u64, row_count: u64 },
    /// A Postgres store needs at least one endpoint to connect to.
    #[error("`store.endpoints` cannot be empty")]
    EndpointsEmpty,
    /// The Postgres wire protocol has no frame compression to negotiate.
    #[error("`store.compression` is not supported by postgres stores")]
    CompressionUnsupported,
    /// Keyspace and table names are required.
    #[error("`schema.{0}` cannot be empty")]
    NameEmpty(&'static str),
    /// The table needs at least one column, the first being the partition key.
    #[error("`schema.columns` cannot be empty")]
    ColumnsEmpty,
    /// Column names must be unique within the table.
    #[error("column `{0}` is declared more than once in `schema.columns`")]
    DuplicateColumn(String),
    /// The migration repartitions on a column that must exist in the table.
    #[error("`migration.partition_column` `{0}` is not a column of the table")]
    UnknownPartitionColumn(String),
}
