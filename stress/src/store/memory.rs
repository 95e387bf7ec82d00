use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use config::shared::ColumnConfig;

use crate::bail;
use crate::error::{ErrorKind, StressResult};
use crate::store::base::StoreClient;
use crate::store::statement::Statement;
use crate::types::Value;

#[derive(Debug)]
struct Table {
    columns: Vec<ColumnConfig>,
    /// Rows indexed by the value of their partition key.
    rows: BTreeMap<Value, Vec<Value>>,
}

impl Table {
    fn upsert(&mut self, columns: &[String], values: &[Value]) -> StressResult<()> {
        if columns.len() != values.len() {
            bail!(
                ErrorKind::InvalidData,
                "Insert has a different number of columns and values",
                format!("{} columns, {} values", columns.len(), values.len())
            );
        }

        let matches_table = columns.len() == self.columns.len()
            && columns
                .iter()
                .zip(self.columns.iter())
                .all(|(name, column)| *name == column.name);
        if !matches_table {
            bail!(
                ErrorKind::SchemaError,
                "Insert columns do not match the table",
                format!("got columns {columns:?}")
            );
        }

        let mut row = Vec::with_capacity(values.len());
        for (value, column) in values.iter().zip(self.columns.iter()) {
            let Some(stored) = value.cast(column.column_type) else {
                bail!(
                    ErrorKind::ConversionError,
                    "Value does not fit the column type",
                    format!(
                        "column '{}' of type {} cannot hold {:?}",
                        column.name, column.column_type, value
                    )
                );
            };
            row.push(stored);
        }

        // Columns are non-empty, which is checked when the table is created.
        let key = row[0].clone();
        self.rows.insert(key, row);

        Ok(())
    }
}

#[derive(Debug)]
struct Keyspace {
    replication_factor: u16,
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Default)]
struct Inner {
    keyspaces: BTreeMap<String, Keyspace>,
    statements: Vec<Statement>,
}

impl Inner {
    fn apply(&mut self, statement: &Statement) -> StressResult<()> {
        match statement {
            Statement::DropKeyspace { keyspace } => {
                if self.keyspaces.remove(keyspace).is_none() {
                    bail!(
                        ErrorKind::KeyspaceMissing,
                        "Keyspace does not exist",
                        format!("keyspace '{keyspace}'")
                    );
                }
            }
            Statement::CreateKeyspace {
                keyspace,
                replication_factor,
            } => {
                if self.keyspaces.contains_key(keyspace) {
                    bail!(
                        ErrorKind::KeyspaceAlreadyExists,
                        "Keyspace already exists",
                        format!("keyspace '{keyspace}'")
                    );
                }

                self.keyspaces.insert(
                    keyspace.clone(),
                    Keyspace {
                        replication_factor: *replication_factor,
                        tables: BTreeMap::new(),
                    },
                );
            }
            Statement::CreateTable {
                keyspace,
                table,
                columns,
            } => {
                let Some(target) = self.keyspaces.get_mut(keyspace) else {
                    bail!(
                        ErrorKind::KeyspaceMissing,
                        "Keyspace does not exist",
                        format!("keyspace '{keyspace}'")
                    );
                };

                if columns.is_empty() {
                    bail!(
                        ErrorKind::SchemaError,
                        "Table has no columns",
                        format!("table '{keyspace}.{table}'")
                    );
                }

                if target.tables.contains_key(table) {
                    bail!(
                        ErrorKind::TableAlreadyExists,
                        "Table already exists",
                        format!("table '{keyspace}.{table}'")
                    );
                }

                target.tables.insert(
                    table.clone(),
                    Table {
                        columns: columns.clone(),
                        rows: BTreeMap::new(),
                    },
                );
            }
            Statement::Insert {
                keyspace,
                table,
                columns,
                values,
            } => {
                let Some(target) = self.keyspaces.get_mut(keyspace) else {
                    bail!(
                        ErrorKind::KeyspaceMissing,
                        "Keyspace does not exist",
                        format!("keyspace '{keyspace}'")
                    );
                };

                let Some(target) = target.tables.get_mut(table) else {
                    bail!(
                        ErrorKind::SchemaError,
                        "Table does not exist",
                        format!("table '{keyspace}.{table}'")
                    );
                };

                target.upsert(columns, values)?;
            }
        }

        Ok(())
    }
}

/// In-memory store for tests and dry runs.
///
/// [`MemoryStoreClient`] interprets statements directly: keyspaces and typed tables are kept in
/// memory and inserts are upserts keyed by the partition key, as on a partitioned store. Values
/// that do not match the column types are rejected. Every executed statement is recorded, whether
/// it succeeded or not, and can be inspected afterward.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreClient {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStoreClient {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every statement executed so far, in execution order.
    pub async fn statements(&self) -> Vec<Statement> {
        let inner = self.inner.lock().await;
        inner.statements.clone()
    }

    /// Returns the replication factor `keyspace` was created with.
    pub async fn replication_factor(&self, keyspace: &str) -> Option<u16> {
        let inner = self.inner.lock().await;
        inner
            .keyspaces
            .get(keyspace)
            .map(|keyspace| keyspace.replication_factor)
    }

    /// Returns the rows of a table ordered by partition key, or `None` when the table is missing.
    pub async fn rows(&self, keyspace: &str, table: &str) -> Option<Vec<Vec<Value>>> {
        let inner = self.inner.lock().await;
        let table = inner.keyspaces.get(keyspace)?.tables.get(table)?;

        Some(table.rows.values().cloned().collect())
    }
}

impl StoreClient for MemoryStoreClient {
    fn name() -> &'static str {
        "memory"
    }

    async fn execute(&self, statement: &Statement) -> StressResult<()> {
        let mut inner = self.inner.lock().await;
        inner.statements.push(statement.clone());

        debug!(%statement, "executing statement in memory");

        inner.apply(statement)
    }
}
