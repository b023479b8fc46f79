//! Configuration file support for research-merge.
//!
//! # Configuration File Format
//!
//! ```toml
//! [merge]
//! pid = "doi"
//! mother_id_column = "MID"
//! mother_id_prefix = "M"
//! incomplete_suffix = "_missing_AB"
//! text_fields = ["title", "abstract"]
//!
//! [columns]
//! title = ["title", "primary_title"]
//! abstract = ["abstract", "abstract note"]
//! doi = ["doi"]
//! included = ["included", "label_included"]
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ColumnDefinitions, Config, LoggingConfig, MergeSettings};

/// Configuration file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Merge section
    #[serde(default)]
    pub merge: MergeSettings,

    /// Column aliases section
    #[serde(default)]
    pub columns: ColumnDefinitions,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        Self {
            merge: config.merge,
            columns: config.columns,
            logging: config.logging,
        }
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            merge: file.merge,
            columns: file.columns,
            logging: file.logging,
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[merge]
pid = "pmid"
incomplete_suffix = "_no_abstract"

[columns]
included = ["decision"]

[logging]
level = "debug"
"#;
        std::fs::write(&path, toml_content).unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert_eq!(config.merge.pid, "pmid");
        assert_eq!(config.merge.incomplete_suffix, "_no_abstract");
        assert_eq!(config.merge.mother_id_prefix, "M");
        assert_eq!(config.columns.included, vec!["decision"]);
        assert_eq!(config.columns.title, vec!["title", "primary_title"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ConfigFile::default();
        config.merge.mother_id_column = "record_id".to_string();
        config.columns.r#abstract = vec!["summary".to_string()];

        config.save(&path).unwrap();

        let loaded = Config::from(ConfigFile::load(&path).unwrap());
        assert_eq!(loaded.merge.mother_id_column, "record_id");
        assert_eq!(loaded.columns.r#abstract, vec!["summary"]);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/config.toml");
        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }
}
