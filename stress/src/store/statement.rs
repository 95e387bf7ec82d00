use pg_escape::{quote_identifier, quote_literal};
use std::fmt;

use config::shared::{ColumnConfig, SchemaConfig};

use crate::types::{Value, WriteTask};

/// A statement executed against the store.
///
/// Statements are typed so that clients which do not speak SQL, such as the in-memory store,
/// can interpret them directly. [`Statement::commands`] renders the SQL sent over the wire for
/// distributed Postgres-wire stores (CockroachDB dialect): a keyspace is a database whose zone
/// configuration holds the replication factor, and `keyspace.table` names its public schema.
/// [`fmt::Display`] joins the commands on one line for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    DropKeyspace {
        keyspace: String,
    },
    /// Creates a keyspace replicated `replication_factor` times.
    CreateKeyspace {
        keyspace: String,
        replication_factor: u16,
    },
    /// Creates a table whose first column is the partition key.
    CreateTable {
        keyspace: String,
        table: String,
        columns: Vec<ColumnConfig>,
    },
    Insert {
        keyspace: String,
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
    },
}

impl Statement {
    pub fn drop_keyspace(schema: &SchemaConfig) -> Self {
        Statement::DropKeyspace {
            keyspace: schema.keyspace.clone(),
        }
    }

    pub fn create_keyspace(schema: &SchemaConfig) -> Self {
        Statement::CreateKeyspace {
            keyspace: schema.keyspace.clone(),
            replication_factor: schema.replication_factor,
        }
    }

    pub fn create_table(schema: &SchemaConfig) -> Self {
        Statement::CreateTable {
            keyspace: schema.keyspace.clone(),
            table: schema.table.clone(),
            columns: schema.columns.clone(),
        }
    }

    /// Builds the insertion of `task` into the table described by `schema`.
    ///
    /// The values are taken as they are; a task whose values do not match the columns yields a
    /// statement the store rejects.
    pub fn insert(schema: &SchemaConfig, task: WriteTask) -> Self {
        Statement::Insert {
            keyspace: schema.keyspace.clone(),
            table: schema.table.clone(),
            columns: schema
                .columns
                .iter()
                .map(|column| column.name.clone())
                .collect(),
            values: task.into_values(),
        }
    }

    /// Returns the keyspace the statement targets.
    pub fn keyspace(&self) -> &str {
        match self {
            Statement::DropKeyspace { keyspace }
            | Statement::CreateKeyspace { keyspace, .. }
            | Statement::CreateTable { keyspace, .. }
            | Statement::Insert { keyspace, .. } => keyspace,
        }
    }

    /// Returns the SQL commands implementing the statement, to be executed in order.
    ///
    /// Every statement renders to a single command except [`Statement::CreateKeyspace`], whose
    /// replication is configured by a second command once the database exists.
    pub fn commands(&self) -> Vec<String> {
        match self {
            Statement::DropKeyspace { keyspace } => {
                vec![format!("DROP DATABASE {} CASCADE;", quote_identifier(keyspace))]
            }
            Statement::CreateKeyspace {
                keyspace,
                replication_factor,
            } => {
                let keyspace = quote_identifier(keyspace);
                vec![
                    format!("CREATE DATABASE {keyspace};"),
                    format!(
                        "ALTER DATABASE {keyspace} CONFIGURE ZONE USING num_replicas = {replication_factor};"
                    ),
                ]
            }
            Statement::CreateTable {
                keyspace,
                table,
                columns,
            } => vec![render_create_table(keyspace, table, columns)],
            Statement::Insert {
                keyspace,
                table,
                columns,
                values,
            } => vec![render_insert(keyspace, table, columns, values)],
        }
    }
}

fn render_create_table(keyspace: &str, table: &str, columns: &[ColumnConfig]) -> String {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            let key = if position == 0 { " PRIMARY KEY" } else { "" };
            format!(
                "{} {}{key}",
                quote_identifier(&column.name),
                column.column_type
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE {}.{} ({columns});",
        quote_identifier(keyspace),
        quote_identifier(table)
    )
}

fn render_insert(keyspace: &str, table: &str, columns: &[String], values: &[Value]) -> String {
    let columns = columns
        .iter()
        .map(|column| quote_identifier(column).to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let values = values
        .iter()
        .map(|value| match value {
            Value::BigInt(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Text(value) => quote_literal(value).to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {}.{} ({columns}) VALUES ({values});",
        quote_identifier(keyspace),
        quote_identifier(table)
    )
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.commands().join(" "))
    }
}
