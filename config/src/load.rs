use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use rust_cli_config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for every configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides, e.g. `APP_WORKLOAD__ROW_COUNT`.
const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested keys in environment variable overrides.
const ENV_SEPARATOR: &str = "__";

const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration structures loaded with [`load_config`].
pub trait Config {
    /// Keys whose environment variable overrides are parsed as comma-separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy)]
enum ConfigFileKind {
    Base,
    Environment(Environment),
}

impl ConfigFileKind {
    fn stem(&self) -> Cow<'static, str> {
        match self {
            ConfigFileKind::Base => Cow::Borrowed("base"),
            ConfigFileKind::Environment(env) => Cow::Borrowed(env.as_str()),
        }
    }
}

impl fmt::Display for ConfigFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileKind::Base => f.write_str("base configuration"),
            ConfigFileKind::Environment(env) => write!(f, "{env} environment configuration"),
        }
    }
}

/// Errors raised while loading the layered configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate the base configuration in `{directory}`; attempted: {attempted}")]
    BaseFileMissing { directory: PathBuf, attempted: String },

    #[error("failed to load {kind_description} from `{path}`: {source}")]
    ConfigurationFileLoad {
        kind_description: String,
        path: PathBuf,
        source: rust_cli_config::ConfigError,
    },

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("failed to build configuration: {0}")]
    Builder(#[source] rust_cli_config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),
}

/// Loads configuration from `./configuration`.
///
/// See [`load_config_from`] for the layering rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    load_config_from(&base_path.join(CONFIGURATION_DIR))
}

/// Loads configuration from `directory`.
///
/// The base file (`base.yaml`, `base.yml` or `base.json`) is mandatory. The file named after
/// the current [`Environment`] is layered on top when present, and `APP_`-prefixed environment
/// variables are applied last. Nested keys use a double underscore (`APP_STORE__PORT`).
pub fn load_config_from<T>(directory: &Path) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    let base_file = find_configuration_file(directory, ConfigFileKind::Base).ok_or_else(|| {
        LoadConfigError::BaseFileMissing {
            directory: directory.to_path_buf(),
            attempted: attempted_paths(directory, ConfigFileKind::Base),
        }
    })?;

    let builder =
        rust_cli_config::Config::builder().add_source(rust_cli_config::File::from(base_file.clone()));
    validate_configuration_source(&builder, ConfigFileKind::Base, &base_file)?;

    let kind = ConfigFileKind::Environment(environment);
    let builder = match find_configuration_file(directory, kind) {
        Some(environment_file) => {
            let builder =
                builder.add_source(rust_cli_config::File::from(environment_file.clone()));
            validate_configuration_source(&builder, kind, &environment_file)?;
            builder
        }
        None => builder,
    };

    let mut environment_source = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source.list_separator(LIST_SEPARATOR);
        for key in T::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    let settings = builder
        .add_source(environment_source)
        .build()
        .map_err(LoadConfigError::Builder)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn candidate_paths(directory: &Path, kind: ConfigFileKind) -> impl Iterator<Item = PathBuf> {
    let stem = kind.stem();
    let directory = directory.to_path_buf();
    CONFIG_FILE_EXTENSIONS
        .iter()
        .map(move |extension| directory.join(format!("{stem}.{extension}")))
}

fn find_configuration_file(directory: &Path, kind: ConfigFileKind) -> Option<PathBuf> {
    candidate_paths(directory, kind).find(|path| path.is_file())
}

fn attempted_paths(directory: &Path, kind: ConfigFileKind) -> String {
    candidate_paths(directory, kind)
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate_configuration_source(
    builder: &ConfigBuilder<DefaultState>,
    kind: ConfigFileKind,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            kind_description: kind.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        workers: u16,
    }

    impl Config for Sample {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stress-config-{test}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = std::env::temp_dir().join("stress-config-definitely-missing");
        let err = load_config_from::<Sample>(&dir).unwrap_err();
        assert!(matches!(err, LoadConfigError::MissingConfigurationDirectory(_)));
    }

    #[test]
    fn missing_base_file_lists_attempted_paths() {
        let dir = scratch_dir("no-base");
        let err = load_config_from::<Sample>(&dir).unwrap_err();
        let LoadConfigError::BaseFileMissing { attempted, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert!(attempted.contains("base.yaml"));
        assert!(attempted.contains("base.json"));
    }

    #[test]
    fn base_file_alone_is_enough() {
        let dir = scratch_dir("base-only");
        fs::write(dir.join("base.yaml"), "name: driver\nworkers: 2\n").unwrap();

        let sample = load_config_from::<Sample>(&dir).unwrap();
        assert_eq!(sample.name, "driver");
        assert_eq!(sample.workers, 2);
    }

    #[test]
    fn malformed_base_file_is_reported_with_its_path() {
        let dir = scratch_dir("malformed");
        fs::write(dir.join("base.json"), "{ not json").unwrap();

        let err = load_config_from::<Sample>(&dir).unwrap_err();
        let LoadConfigError::ConfigurationFileLoad { path, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert!(path.ends_with("base.json"));
    }
}
