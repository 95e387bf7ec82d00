use serde::Deserialize;
use std::path::PathBuf;

/// Settings of the administrative command that repartitions the table.
///
/// The command line is assembled as
/// `{store_home}/{tool} -p {admin_port} -m {"column":"<partition_column>"} {operation} <keyspace> <table>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MigrationConfig {
    /// Installation directory of the store.
    pub store_home: PathBuf,
    /// Administrative tool, relative to [`MigrationConfig::store_home`].
    pub tool: PathBuf,
    /// Port of the administrative interface.
    pub admin_port: u16,
    /// Name of the administrative operation.
    pub operation: String,
    /// Column the table is repartitioned on.
    pub partition_column: String,
}

impl MigrationConfig {
    /// Returns the full path of the administrative tool.
    pub fn tool_path(&self) -> PathBuf {
        self.store_home.join(&self.tool)
    }
}
