use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

/// Default SQL port of CockroachDB nodes.
const fn default_port() -> u16 {
    26257
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_application_name() -> String {
    "stress_driver".to_string()
}

/// Store the driver writes to.
///
/// The variant is selected with the `kind` key, for example `kind: postgres`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store, useful for dry runs of the workload without a cluster.
    Memory,
    /// A Postgres-wire compatible distributed store.
    Postgres(StoreConnectionConfig),
}

impl StoreConfig {
    /// Validates the store configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Postgres(connection) => connection.validate(),
        }
    }
}

/// Connection settings for a Postgres-wire store.
///
/// This intentionally does not implement `Serialize` so that the password cannot leak
/// through serialized forms; `Debug` output redacts it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConnectionConfig {
    /// Hosts of the cluster nodes. The client tries them in order until one accepts.
    pub endpoints: Vec<String>,
    /// Port shared by every endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database to connect to.
    pub name: String,
    /// User to authenticate as.
    pub username: String,
    /// Password for [`StoreConnectionConfig::username`].
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Whether wire compression is requested. Rejected by validation, the Postgres wire protocol
    /// cannot compress frames.
    #[serde(default)]
    pub compression: bool,
    /// Application name reported to the store.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Timeout for establishing the connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl StoreConnectionConfig {
    /// Validates the connection settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoints.is_empty() {
            return Err(ValidationError::EndpointsEmpty);
        }

        if self.compression {
            return Err(ValidationError::CompressionUnsupported);
        }

        Ok(())
    }
}

#[cfg(feature = "tokio-postgres")]
mod tokio_postgres_options {
    use secrecy::ExposeSecret;
    use std::time::Duration;
    use tokio_postgres::Config as TokioPgConnectOptions;

    use super::StoreConnectionConfig;

    impl StoreConnectionConfig {
        /// Builds `tokio-postgres` connection options targeting every configured endpoint.
        pub fn to_connect_options(&self) -> TokioPgConnectOptions {
            let mut options = TokioPgConnectOptions::new();
            for endpoint in &self.endpoints {
                options.host(endpoint);
            }

            options
                .port(self.port)
                .dbname(&self.name)
                .user(&self.username)
                .application_name(&self.application_name)
                .connect_timeout(Duration::from_millis(self.connect_timeout_ms));

            if let Some(password) = &self.password {
                options.password(password.expose_secret());
            }

            options
        }
    }
}
