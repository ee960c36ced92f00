//! Configuration loading for the catalog browser.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration, loaded from TOML.
///
/// The staleness windows are the per-key cache policies; `retention_ms`
/// applies to single-product and category entries (the product list always
/// uses zero retention, see [`crate::CatalogContext`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub staleness: StalenessConfig,
    pub retention_ms: u64,
    pub sweep_interval_ms: u64,
}

/// Per-key staleness windows in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StalenessConfig {
    /// Product list. Zero means every fresh subscription refetches.
    pub products_ms: u64,
    /// Single product detail.
    pub product_ms: u64,
    /// Category labels, which rarely change.
    pub categories_ms: u64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            products_ms: 0,
            product_ms: 5 * 60 * 1000,
            categories_ms: 30 * 60 * 1000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fakestoreapi.com".to_string(),
            request_timeout_ms: 10_000,
            staleness: StalenessConfig::default(),
            retention_ms: 5 * 60 * 1000,
            sweep_interval_ms: 60_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or VITRINE_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CatalogConfig {
    /// Load from the path given by `--config` or `VITRINE_CONFIG`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: CatalogConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("VITRINE_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_TOML: &str = r#"
base_url = "https://catalog.example.com"
request_timeout_ms = 5000
retention_ms = 300000
sweep_interval_ms = 30000

[staleness]
products_ms = 0
product_ms = 300000
categories_ms = 1800000
"#;

    #[test]
    fn default_config_validates() {
        assert!(CatalogConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_a_complete_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(VALID_TOML.as_bytes()).expect("write");

        let config = CatalogConfig::from_path(file.path()).expect("parse");
        assert_eq!(config.base_url, "https://catalog.example.com");
        assert_eq!(config.staleness.products_ms, 0);
        assert_eq!(config.staleness.categories_ms, 1_800_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml = format!("{VALID_TOML}\nextra_knob = true\n");
        assert!(toml::from_str::<CatalogConfig>(&toml).is_err());
    }

    #[test]
    fn rejects_empty_base_url() {
        let config = CatalogConfig {
            base_url: "  ".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "base_url",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = CatalogConfig {
            request_timeout_ms: 0,
            ..CatalogConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn zero_products_window_is_allowed() {
        let mut config = CatalogConfig::default();
        config.staleness.products_ms = 0;
        assert!(config.validate().is_ok());
    }
}
