//! Exchange Configuration - matching limits, timeouts and backends as TOML values
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so a missing file or section behaves exactly like the built-in settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "EXCHANGE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "exchange_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an exchange deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Deficiency threshold and offer ranking limits
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Bounds on external calls
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Offer persistence backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote model endpoints
    #[serde(default)]
    pub models: ModelsConfig,

    /// Reference data source
    #[serde(default)]
    pub reference: ReferenceConfig,
}

impl MarketConfig {
    /// Load configuration using the standard search order:
    /// 1. `explicit` path (from `--config`)
    /// 2. `$EXCHANGE_CONFIG`
    /// 3. `./exchange_config.toml`
    /// 4. Built-in defaults
    ///
    /// An explicit path that fails to load is logged and skipped, like the
    /// other sources; the service always starts with a valid config.
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded exchange config from --config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load --config file, falling back");
                }
            }
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded exchange config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded exchange config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No exchange config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate ranges. Suspicious-but-legal values are only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Configuration loading error.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Matching
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fraction of the crop target below which a nutrient is deficient
    #[serde(default = "default_deficiency_threshold")]
    pub deficiency_threshold: f64,

    /// Search radius around the farmer (km)
    #[serde(default = "default_max_search_radius_km")]
    pub max_search_radius_km: f64,

    /// Ranked offers returned per request
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

const fn default_deficiency_threshold() -> f64 {
    defaults::DEFICIENCY_THRESHOLD
}

const fn default_max_search_radius_km() -> f64 {
    defaults::MAX_SEARCH_RADIUS_KM
}

const fn default_max_results() -> usize {
    defaults::MAX_RANKED_OFFERS
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            deficiency_threshold: default_deficiency_threshold(),
            max_search_radius_km: default_max_search_radius_km(),
            max_results: default_max_results(),
        }
    }
}

// ============================================================================
// Timeouts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_classifier_ms")]
    pub classifier_ms: u64,
    #[serde(default = "default_detector_ms")]
    pub detector_ms: u64,
    #[serde(default = "default_persistence_ms")]
    pub persistence_ms: u64,
}

const fn default_classifier_ms() -> u64 {
    defaults::CLASSIFIER_TIMEOUT_MS
}

const fn default_detector_ms() -> u64 {
    defaults::DETECTOR_TIMEOUT_MS
}

const fn default_persistence_ms() -> u64 {
    defaults::PERSISTENCE_TIMEOUT_MS
}

impl TimeoutConfig {
    pub const fn classifier(&self) -> Duration {
        Duration::from_millis(self.classifier_ms)
    }

    pub const fn detector(&self) -> Duration {
        Duration::from_millis(self.detector_ms)
    }

    pub const fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classifier_ms: default_classifier_ms(),
            detector_ms: default_detector_ms(),
            persistence_ms: default_persistence_ms(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Where listed offers are made durable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Sled tree under `data_dir/offers.db`
    #[default]
    Sled,
    /// Pretty JSON snapshot at `data_dir/offers.json`
    Json,
    /// Nothing survives a restart
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sled => write!(f, "sled"),
            Self::Json => write!(f, "json"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::DATA_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `EXCHANGE_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

/// Remote model endpoints. Unset endpoints fall back to built-in behaviour:
/// profile similarity for the classifier, "unavailable" for the detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub classifier_url: Option<String>,
    #[serde(default)]
    pub detector_url: Option<String>,
}

// ============================================================================
// Reference Data
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// TOML file with nutrient, crop, waste-class and producer tables.
    /// Built-in tables are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(MarketConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MarketConfig::from_toml_str(
            r#"
[matching]
max_search_radius_km = 25.0

[storage]
backend = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.matching.max_search_radius_km, 25.0);
        assert_eq!(config.matching.deficiency_threshold, 0.6);
        assert_eq!(config.matching.max_results, 5);
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.timeouts.classifier(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = MarketConfig::from_toml_str(
            r#"
[matching]
deficiency_threshold = 1.5
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = MarketConfig::default();
        config.models.classifier_url = Some("http://models:9000/predict".to_string());
        let text = config.to_toml().unwrap();
        let parsed = MarketConfig::from_toml_str(&text).unwrap();
        assert_eq!(
            parsed.models.classifier_url.as_deref(),
            Some("http://models:9000/predict")
        );
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let result = MarketConfig::load_from_file(Path::new("/nonexistent/exchange.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
