use std::fmt;
use std::io;
use std::str::FromStr;

/// Environment variable selecting which environment configuration file is layered on top of
/// the base configuration.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

const DEV_ENV_NAME: &str = "dev";

const CI_ENV_NAME: &str = "ci";

const PROD_ENV_NAME: &str = "prod";

/// Runtime environment the driver is launched in.
///
/// Each environment maps to a `configuration/{name}.yaml` file which overrides the base
/// configuration, for example to point the driver at a local cluster during development
/// or to shrink the workload in CI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development against a small cluster.
    Dev,
    /// Continuous integration runs.
    Ci,
    /// Full-size stress runs against a production-like cluster.
    Prod,
}

impl Environment {
    /// Loads the environment from `APP_ENVIRONMENT`, defaulting to [`Environment::Dev`].
    pub fn load() -> Result<Environment, io::Error> {
        match std::env::var(APP_ENVIRONMENT_ENV_NAME) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::Dev),
        }
    }

    /// Returns the name used for the environment configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => DEV_ENV_NAME,
            Environment::Ci => CI_ENV_NAME,
            Environment::Prod => PROD_ENV_NAME,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = io::Error;

    /// Parses an environment name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            DEV_ENV_NAME => Ok(Environment::Dev),
            CI_ENV_NAME => Ok(Environment::Ci),
            PROD_ENV_NAME => Ok(Environment::Prod),
            other => Err(io::Error::other(format!(
                "{other} is not a supported environment. Use one of `{DEV_ENV_NAME}`, `{CI_ENV_NAME}` or `{PROD_ENV_NAME}`.",
            ))),
        }
    }
}
