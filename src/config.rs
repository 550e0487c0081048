//! Configuration file handling.
//!
//! Settings come from `vigia.toml` in the working directory, or from the file
//! named by `VIGIA_CONFIG`. Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "VIGIA_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "vigia.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the detections and the logo come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Drive download link of the detections CSV.
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_logo_url")]
    pub logo_url: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// How long a downloaded file stays valid.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            logo_url: default_logo_url(),
            timeout_seconds: default_timeout(),
            cache_ttl_hours: default_cache_ttl_hours(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 60 * 60)
    }
}

fn default_url() -> String {
    "https://drive.google.com/uc?export=download&id=1YlThY76iiE6TwU9ZPlBfNkm8FsccjCZm".to_string()
}

fn default_logo_url() -> String {
    "https://drive.google.com/uc?export=download&id=1sUYhDEuduVYtF9dBn0CcIRYiMT9qc7o4".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl_hours() -> u64 {
    24
}

/// Sizes of the ranked views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_top_municipalities")]
    pub top_municipalities: usize,

    #[serde(default = "default_critical_regions")]
    pub critical_regions: usize,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_municipalities: default_top_municipalities(),
            critical_regions: default_critical_regions(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_top_municipalities() -> usize {
    10
}

fn default_critical_regions() -> usize {
    crate::data::aggregate::DEFAULT_CRITICAL_REGIONS
}

fn default_histogram_bins() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Accent colour for charts and headings, `#rrggbb`.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
        }
    }
}

fn default_primary_color() -> String {
    "#ff6347".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve the config path and load it; defaults when no file exists.
    pub fn discover() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.source.url.contains("id="));
        assert_eq!(config.source.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.source.timeout(), Duration::from_secs(30));
        assert_eq!(config.analysis.top_municipalities, 10);
        assert_eq!(config.analysis.critical_regions, 5);
        assert_eq!(config.ui.primary_color, "#ff6347");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[source]
url = "https://drive.google.com/uc?export=download&id=abc"
cache_ttl_hours = 1

[analysis]
critical_regions = 8
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.source.url.ends_with("id=abc"));
        assert_eq!(config.source.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.analysis.critical_regions, 8);
        assert_eq!(config.analysis.top_municipalities, 10);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigia.toml");
        std::fs::write(&path, "[ui]\nprimary_color = \"#00aa00\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ui.primary_color, "#00aa00");

        std::fs::write(&path, "[ui\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
