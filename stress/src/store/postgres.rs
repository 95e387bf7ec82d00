use config::shared::StoreConnectionConfig;
use std::sync::Arc;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Connection, NoTls, Socket};
use tracing::{Instrument, debug, error, info};

use crate::error::StressResult;
use crate::store::base::StoreClient;
use crate::store::statement::Statement;

/// Spawns a background task driving a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        match connection.await {
            Err(err) => error!("an error occurred during the store connection: {}", err),
            Ok(()) => info!("store connection terminated successfully"),
        }
    }
    .instrument(span);

    // The connection ends on its own once every clone of the `Client` has been dropped.
    tokio::spawn(task);
}

/// Client for distributed Postgres-wire stores speaking the CockroachDB dialect.
///
/// The connection is opened against the configured endpoints, which are tried in order until one
/// of them accepts. Every clone of the client multiplexes its statements over that connection.
#[derive(Debug, Clone)]
pub struct PgStoreClient {
    client: Arc<Client>,
}

impl PgStoreClient {
    /// Connects to the store described by `config`.
    ///
    /// The configuration is expected to be validated, which rules out wire compression.
    pub async fn connect(config: &StoreConnectionConfig) -> StressResult<Self> {
        let options = config.to_connect_options();
        let (client, connection) = options.connect(NoTls).await?;

        spawn_postgres_connection::<NoTls>(connection);

        info!(endpoints = ?config.endpoints, port = config.port, "connected to the store");

        Ok(PgStoreClient {
            client: Arc::new(client),
        })
    }
}

impl StoreClient for PgStoreClient {
    fn name() -> &'static str {
        "postgres"
    }

    async fn execute(&self, statement: &Statement) -> StressResult<()> {
        for sql in statement.commands() {
            debug!(%sql, "executing statement");
            self.client.batch_execute(&sql).await?;
        }

        Ok(())
    }
}
