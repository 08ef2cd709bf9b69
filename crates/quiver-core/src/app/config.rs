//! RepositoryConfig - 構築時の設定
//!
//! TOML から読み込める。全フィールドにデフォルト値がある。

use serde::{Deserialize, Serialize};

use crate::domain::MAX_PAD_WIDTH;

/// Construction-time configuration of a `Repository`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Blob namespace (bucket) holding artifact content.
    pub blob_container: String,

    /// Metadata namespace (table) holding version and alias records.
    pub metadata_table: String,

    /// Appended to every blob key, e.g. `.json`.
    pub file_suffix: String,

    /// Digit width of numbered version tokens.
    pub version_zero_pad_width: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            blob_container: "artifacts".to_string(),
            metadata_table: "artifact-metadata".to_string(),
            file_suffix: String::new(),
            version_zero_pad_width: 8,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse repository config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid repository config: {0}")]
    Invalid(String),
}

impl RepositoryConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Example
    /// ```ignore
    /// let config = RepositoryConfig::from_toml_str(r#"
    ///     blob_container = "ml-models"
    ///     file_suffix = ".bin"
    /// "#)?;
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blob_container.trim().is_empty() {
            return Err(ConfigError::Invalid("blob_container must not be empty".into()));
        }
        if self.metadata_table.trim().is_empty() {
            return Err(ConfigError::Invalid("metadata_table must not be empty".into()));
        }
        if self.file_suffix.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "file_suffix must not contain '/', got {:?}",
                self.file_suffix
            )));
        }
        if !(1..=MAX_PAD_WIDTH).contains(&self.version_zero_pad_width) {
            return Err(ConfigError::Invalid(format!(
                "version_zero_pad_width must be within 1..={MAX_PAD_WIDTH}, got {}",
                self.version_zero_pad_width
            )));
        }
        Ok(())
    }
}
