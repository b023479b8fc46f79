//! Configuration management.

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "research-merge.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Deduplication and output settings
    #[serde(default)]
    pub merge: MergeSettings,

    /// Accepted header names per semantic field
    #[serde(default)]
    pub columns: ColumnDefinitions,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deduplication and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Persistent identifier column used for identity matching
    #[serde(default = "default_pid")]
    pub pid: String,

    /// Column holding the mother-ID
    #[serde(default = "default_mother_id_column")]
    pub mother_id_column: String,

    /// Prefix of minted mother-IDs (`M0`, `M1`, ...)
    #[serde(default = "default_mother_id_prefix")]
    pub mother_id_prefix: String,

    /// Appended to the output file stem for records without an abstract
    #[serde(default = "default_incomplete_suffix")]
    pub incomplete_suffix: String,

    /// Fields joined to build the text key
    #[serde(default = "default_text_fields")]
    pub text_fields: Vec<String>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            pid: default_pid(),
            mother_id_column: default_mother_id_column(),
            mother_id_prefix: default_mother_id_prefix(),
            incomplete_suffix: default_incomplete_suffix(),
            text_fields: default_text_fields(),
        }
    }
}

fn default_pid() -> String {
    "doi".to_string()
}

fn default_mother_id_column() -> String {
    "MID".to_string()
}

fn default_mother_id_prefix() -> String {
    "M".to_string()
}

fn default_incomplete_suffix() -> String {
    "_missing_AB".to_string()
}

fn default_text_fields() -> Vec<String> {
    vec!["title".to_string(), "abstract".to_string()]
}

/// Semantic fields the loader knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Abstract,
    Doi,
    Included,
}

impl Field {
    /// Canonical column name after loading
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Abstract => "abstract",
            Field::Doi => "doi",
            Field::Included => "included",
        }
    }
}

/// Accepted source-file header names for each semantic field.
///
/// Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinitions {
    #[serde(default = "default_title_aliases")]
    pub title: Vec<String>,

    #[serde(default = "default_abstract_aliases")]
    pub r#abstract: Vec<String>,

    #[serde(default = "default_doi_aliases")]
    pub doi: Vec<String>,

    #[serde(default = "default_included_aliases")]
    pub included: Vec<String>,
}

impl Default for ColumnDefinitions {
    fn default() -> Self {
        Self {
            title: default_title_aliases(),
            r#abstract: default_abstract_aliases(),
            doi: default_doi_aliases(),
            included: default_included_aliases(),
        }
    }
}

impl ColumnDefinitions {
    pub fn aliases(&self, field: Field) -> &[String] {
        match field {
            Field::Title => &self.title,
            Field::Abstract => &self.r#abstract,
            Field::Doi => &self.doi,
            Field::Included => &self.included,
        }
    }

    /// Which field a header denotes, if any
    pub fn resolve(&self, header: &str) -> Option<Field> {
        let header = header.trim();
        [Field::Title, Field::Abstract, Field::Doi, Field::Included]
            .into_iter()
            .find(|&field| {
                self.aliases(field)
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(header))
            })
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_title_aliases() -> Vec<String> {
    strings(&["title", "primary_title"])
}

fn default_abstract_aliases() -> Vec<String> {
    strings(&["abstract", "abstract note", "notes_abstract"])
}

fn default_doi_aliases() -> Vec<String> {
    strings(&["doi"])
}

fn default_included_aliases() -> Vec<String> {
    strings(&[
        "final_included",
        "label",
        "label_included",
        "included_label",
        "included_final",
        "included",
        "included_flag",
        "include",
    ])
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with `RESEARCH_MERGE_*` environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("RESEARCH_MERGE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the working directory or the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("research-merge").join("config.toml");
    user.is_file().then_some(user)
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
