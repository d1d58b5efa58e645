use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CliError;

pub const CONFIG_FILE_NAME: &str = "meta-forge.toml";

/// CLI configuration loaded from `meta-forge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub cli: CliSettings,
}

/// Defaults for `generate` and `diff`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Dialect used when `--generator` is not given.
    #[serde(default)]
    pub dialect: Option<String>,
}

/// Names of the version marker updated at the end of a migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    #[serde(default = "default_version_table")]
    pub version_table: String,
    #[serde(default = "default_version_column")]
    pub version_column: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            version_table: default_version_table(),
            version_column: default_version_column(),
        }
    }
}

/// CLI-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CliSettings {
    /// Extension searched for when a directory is passed as a source.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
        }
    }
}

fn default_version_table() -> String {
    meta_forge_sql::migrate::DEFAULT_VERSION_TABLE.to_string()
}

fn default_version_column() -> String {
    meta_forge_sql::migrate::DEFAULT_VERSION_COLUMN.to_string()
}

fn default_source_extension() -> String {
    "meta".to_string()
}

/// Discovery order for the config file:
/// 1. `--config <path>` or `META_FORGE_CONFIG` (explicit; must exist)
/// 2. `./meta-forge.toml` (project-local)
/// 3. `$XDG_CONFIG_HOME/meta-forge/config.toml`
/// 4. `~/.config/meta-forge/config.toml`
pub fn load_config(explicit_path: Option<&Path>) -> Result<CliConfig, CliError> {
    if let Some(path) = explicit_path {
        return load_config_from_path(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from_path(&local);
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join("meta-forge/config.toml");
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config/meta-forge/config.toml");
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(CliConfig::default())
}

fn load_config_from_path(path: &Path) -> Result<CliConfig, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = toml::from_str(&contents).map_err(|e| CliError::Config {
        message: format!("failed to parse {}: {}", path.display(), e),
    })?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CliConfig::default();
        assert_eq!(config.generate.dialect, None);
        assert_eq!(config.migration.version_table, "SchemaVersion");
        assert_eq!(config.migration.version_column, "Version");
        assert_eq!(config.cli.source_extension, "meta");
    }

    #[test]
    fn parse_minimal_toml() {
        let toml_str = r#"
[generate]
dialect = "postgresql"
"#;
        let config: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generate.dialect.as_deref(), Some("postgresql"));
        assert_eq!(config.migration, MigrationConfig::default());
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[generate]
dialect = "oracle"

[migration]
version_table = "DbInfo"
version_column = "SchemaLevel"

[cli]
source_extension = "sqlmeta"
"#;
        let config: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generate.dialect.as_deref(), Some("oracle"));
        assert_eq!(config.migration.version_table, "DbInfo");
        assert_eq!(config.migration.version_column, "SchemaLevel");
        assert_eq!(config.cli.source_extension, "sqlmeta");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<CliConfig, _> = toml::from_str("[generate]\ndialekt = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[migration]\nversion_table = \"Meta\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.migration.version_table, "Meta");
    }

    #[test]
    fn load_config_from_explicit_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/meta-forge.toml")));
        assert!(matches!(result, Err(CliError::Io { .. })));
    }

    #[test]
    fn load_config_reports_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[generate\n").unwrap();
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(CliError::Config { .. })));
    }
}
