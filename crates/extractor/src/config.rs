use crate::error::{ExtractError, Result};
use crate::filter::FilterConfig;
use crate::source::Compression;
use mrf_json_stream::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field holding the file list in Transparency-in-Coverage index files
pub const DEFAULT_TARGET_KEY: &str = "in_network_files";

/// Records between two progress lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Configuration for one extraction run.
///
/// Loadable from TOML; every field is optional there and falls back to the default:
///
/// ```toml
/// target_key = "in_network_files"
/// progress_interval = 10000
///
/// [filter]
/// subdomain = "empirebcbs"
/// description_contains = "ppo"
/// vendor_domain = "bcbs.com"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Field name whose array holds the records
    pub target_key: String,

    /// Input encoding
    pub compression: Compression,

    /// Log a progress line every N records (0 disables)
    pub progress_interval: u64,

    /// Maximum JSON nesting depth accepted
    pub max_depth: usize,

    /// Write output lines in sorted order
    pub sorted_output: bool,

    /// Reference filter parameters
    pub filter: FilterConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            target_key: DEFAULT_TARGET_KEY.to_string(),
            compression: Compression::Auto,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            max_depth: DEFAULT_MAX_DEPTH,
            sorted_output: false,
            filter: FilterConfig::default(),
        }
    }
}

impl ExtractConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            ExtractError::invalid_config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&text).map_err(|err| match err {
            ExtractError::InvalidConfig(msg) => {
                ExtractError::invalid_config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| ExtractError::invalid_config(err.to_string()))?;
        config.validate().map_err(ExtractError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.target_key.is_empty() {
            return Err("target_key must not be empty".to_string());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be > 0".to_string());
        }
        self.filter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = ExtractConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_key, "in_network_files");
        assert_eq!(config.progress_interval, 10_000);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ExtractConfig::from_toml_str(
            r#"
            compression = "gzip"
            sorted_output = true

            [filter]
            subdomain = "anthembcbsco"
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            ExtractConfig {
                compression: Compression::Gzip,
                sorted_output: true,
                filter: FilterConfig {
                    subdomain: "anthembcbsco".to_string(),
                    ..FilterConfig::default()
                },
                ..ExtractConfig::default()
            }
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ExtractConfig::from_toml_str(r#"target_key = """#).is_err());
        assert!(ExtractConfig::from_toml_str("max_depth = 0").is_err());
        assert!(ExtractConfig::from_toml_str("[filter]\nsubdomain = \"\"").is_err());
        assert!(ExtractConfig::from_toml_str("unknown_key = 1").is_err());
        assert!(ExtractConfig::from_toml_str(r#"compression = "zstd""#).is_err());
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mrf.toml");
        std::fs::write(&path, "progress_interval = \"often\"").unwrap();
        let err = ExtractConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("mrf.toml"));
    }
}
