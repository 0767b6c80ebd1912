//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `REDIS_METRICS_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the backing Redis server
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database index selected after connecting
    #[serde(default)]
    pub db: i64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
        }
    }
}

impl StoreConfig {
    /// Connection URL understood by the `redis` crate
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Names of the well-known registry sets
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_metric_slugs_key")]
    pub metric_slugs_key: String,

    #[serde(default = "default_gauge_slugs_key")]
    pub gauge_slugs_key: String,

    #[serde(default = "default_categories_key")]
    pub categories_key: String,
}

fn default_metric_slugs_key() -> String {
    "metric-slugs".to_string()
}

fn default_gauge_slugs_key() -> String {
    "gauge-slugs".to_string()
}

fn default_categories_key() -> String {
    "categories".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            metric_slugs_key: default_metric_slugs_key(),
            gauge_slugs_key: default_gauge_slugs_key(),
            categories_key: default_categories_key(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("redis-metrics").join("config.toml")),
            Some(PathBuf::from("/etc/redis-metrics/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Store overrides
        if let Ok(host) = std::env::var("REDIS_METRICS_HOST") {
            self.store.host = host;
        }
        if let Ok(port) = std::env::var("REDIS_METRICS_PORT") {
            if let Ok(p) = port.parse() {
                self.store.port = p;
            }
        }
        if let Ok(db) = std::env::var("REDIS_METRICS_DB") {
            if let Ok(d) = db.parse() {
                self.store.db = d;
            }
        }

        // Registry overrides
        if let Ok(key) = std::env::var("REDIS_METRICS_METRIC_SLUGS_KEY") {
            self.registry.metric_slugs_key = key;
        }
        if let Ok(key) = std::env::var("REDIS_METRICS_GAUGE_SLUGS_KEY") {
            self.registry.gauge_slugs_key = key;
        }
        if let Ok(key) = std::env::var("REDIS_METRICS_CATEGORIES_KEY") {
            self.registry.categories_key = key;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("REDIS_METRICS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("REDIS_METRICS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# redis-metrics configuration
#
# Environment variables override these settings:
# - REDIS_METRICS_HOST
# - REDIS_METRICS_PORT
# - REDIS_METRICS_DB
# - REDIS_METRICS_METRIC_SLUGS_KEY
# - REDIS_METRICS_GAUGE_SLUGS_KEY
# - REDIS_METRICS_CATEGORIES_KEY
# - REDIS_METRICS_LOG_LEVEL
# - REDIS_METRICS_LOG_FORMAT

[store]
# Redis server host
host = "localhost"

# Redis server port
port = 6379

# Database index
db = 0

[registry]
# Set holding every metric slug ever recorded
metric_slugs_key = "metric-slugs"

# Set holding every gauge slug ever recorded
gauge_slugs_key = "gauge-slugs"

# Set holding every category name
categories_key = "categories"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
