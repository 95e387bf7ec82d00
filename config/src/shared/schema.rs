use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::shared::ValidationError;

/// Column types supported by the stress table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit signed integer.
    #[serde(rename = "bigint")]
    BigInt,
    /// 32-bit signed integer.
    Int,
    /// Variable-length text.
    Varchar,
}

impl ColumnType {
    /// Returns the SQL spelling of the type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Int => "int",
            ColumnType::Varchar => "varchar",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single column of the stress table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Schema provisioned before the workload starts.
///
/// The first column of [`SchemaConfig::columns`] is the partition key of the table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchemaConfig {
    /// Keyspace holding the table. It is dropped and recreated on every run.
    pub keyspace: String,
    /// Name of the table receiving the writes.
    pub table: String,
    /// Number of copies of each row kept by the cluster.
    pub replication_factor: u16,
    /// Ordered column definitions.
    pub columns: Vec<ColumnConfig>,
}

impl SchemaConfig {
    /// Returns the partition key column.
    pub fn partition_key(&self) -> Option<&ColumnConfig> {
        self.columns.first()
    }

    /// Returns `true` when a column named `name` exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    /// Validates names and columns.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keyspace.trim().is_empty() {
            return Err(ValidationError::NameEmpty("keyspace"));
        }

        if self.table.trim().is_empty() {
            return Err(ValidationError::NameEmpty("table"));
        }

        if self.columns.is_empty() {
            return Err(ValidationError::ColumnsEmpty);
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ValidationError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(())
    }
}
