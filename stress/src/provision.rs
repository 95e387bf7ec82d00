use tracing::info;

use config::shared::SchemaConfig;

use crate::error::{ErrorKind, StressResult};
use crate::store::{Statement, StoreClient};

/// Executes `statement` and logs it, mirroring every statement sent to the store in the logs.
pub async fn execute_logged<C>(client: &C, statement: &Statement) -> StressResult<()>
where
    C: StoreClient,
{
    info!(%statement, store = C::name(), "executing statement");
    client.execute(statement).await
}

/// Provisions a fresh schema for the run.
///
/// The keyspace is dropped first, ignoring the failure raised when it does not exist, then the
/// keyspace and the table are created. Statements run sequentially before any concurrent work
/// starts. Any other failure aborts the run.
pub async fn provision_schema<C>(client: &C, schema: &SchemaConfig) -> StressResult<()>
where
    C: StoreClient,
{
    match execute_logged(client, &Statement::drop_keyspace(schema)).await {
        Ok(()) => info!(keyspace = %schema.keyspace, "dropped leftover keyspace"),
        Err(err) if err.kind() == ErrorKind::KeyspaceMissing => {
            info!(keyspace = %schema.keyspace, "keyspace does not exist yet, nothing to drop");
        }
        Err(err) => return Err(err),
    }

    info!(
        keyspace = %schema.keyspace,
        replication_factor = schema.replication_factor,
        "creating keyspace"
    );
    execute_logged(client, &Statement::create_keyspace(schema)).await?;
    execute_logged(client, &Statement::create_table(schema)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use config::shared::{ColumnConfig, ColumnType};

    use super::*;
    use crate::store::memory::MemoryStoreClient;
    use crate::types::{Value, WriteTask};

    fn schema() -> SchemaConfig {
        SchemaConfig {
            keyspace: "ks".to_string(),
            table: "cf".to_string(),
            replication_factor: 1,
            columns: vec![ColumnConfig {
                name: "id".to_string(),
                column_type: ColumnType::BigInt,
            }],
        }
    }

    #[tokio::test]
    async fn provisioning_a_fresh_store_ignores_the_missing_keyspace() {
        let store = MemoryStoreClient::new();
        provision_schema(&store, &schema()).await.unwrap();

        assert_eq!(store.rows("ks", "cf").await, Some(vec![]));
        assert_eq!(store.statements().await.len(), 3);
    }

    #[tokio::test]
    async fn reprovisioning_yields_an_empty_table() {
        let schema = schema();
        let store = MemoryStoreClient::new();
        provision_schema(&store, &schema).await.unwrap();

        let task = WriteTask::new(0, vec![Value::BigInt(0)]);
        store
            .execute(&Statement::insert(&schema, task))
            .await
            .unwrap();
        assert_eq!(store.rows("ks", "cf").await.map(|rows| rows.len()), Some(1));

        provision_schema(&store, &schema).await.unwrap();
        assert_eq!(store.rows("ks", "cf").await, Some(vec![]));
    }
}
