//! Client configuration with layered resolution and range validation.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHUNK_SIZE_RANGE, CONFIG_FILE_NAME, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_REPORTING_API_VERSION,
    DEFAULT_REPORTING_ENDPOINT, DEFAULT_REPORTING_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    ENV_ENV_VAR, RECOMMENDED_CHUNK_SIZE_RANGE, RECOMMENDED_REPORTING_INTERVAL_RANGE,
    REPORTING_INTERVAL_RANGE,
};
use crate::errors::ConfigError;
use crate::models::Source;

/// Everything the delivery pipeline reads at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Delivery kill-switch. Checked at dispatch time and again at send time.
    pub enable: bool,
    /// Verbose logging of every enqueue and config mutation.
    pub debug: bool,
    /// Deployment environment reported in every envelope.
    pub env: Option<String>,
    /// Bucket that receives the events.
    pub bucket: Option<String>,
    /// API token. Takes precedence over `BITCLOCK_TOKEN` and the cookie.
    pub token: Option<String>,
    /// Raw `Cookie` header consulted for a `BITCLOCK_TOKEN` entry.
    pub cookie: Option<String>,
    /// Maximum events per delivery batch.
    pub max_chunk_size: u32,
    /// Minimum spacing between two sends, in milliseconds.
    pub reporting_interval_ms: u64,
    pub reporting_endpoint: String,
    pub reporting_api_version: String,
    /// HTTP request timeout, in milliseconds.
    pub request_timeout_ms: u64,
    pub source: Source,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enable: true,
            debug: false,
            env: None,
            bucket: None,
            token: None,
            cookie: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            reporting_interval_ms: DEFAULT_REPORTING_INTERVAL_MS,
            reporting_endpoint: DEFAULT_REPORTING_ENDPOINT.to_string(),
            reporting_api_version: DEFAULT_REPORTING_API_VERSION.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            source: Source::default(),
            user_agent: None,
        }
    }
}

/// One partial configuration layer (a TOML file). Only `Some` values
/// override the layer below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub enable: Option<bool>,
    pub debug: Option<bool>,
    pub env: Option<String>,
    pub bucket: Option<String>,
    pub token: Option<String>,
    pub cookie: Option<String>,
    pub max_chunk_size: Option<u32>,
    pub reporting_interval_ms: Option<u64>,
    pub reporting_endpoint: Option<String>,
    pub reporting_api_version: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub source: Option<Source>,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. Environment variables (`BITCLOCK_*`)
    /// 2. Project config (`bitclock.toml` in `root`, if present)
    /// 3. Compiled defaults
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from an explicit file path; the file must exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        Self::merge_toml_file(&mut config, path)?;
        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse a configuration from a TOML string on top of the defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let layer: ConfigLayer = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::default();
        config.merge(layer);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate every field against its hard bounds.
    ///
    /// Values inside the hard bounds but outside the recommended band are
    /// accepted with a warning.
    pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
        Self::check_max_chunk_size(config.max_chunk_size)?;
        Self::check_reporting_interval(config.reporting_interval_ms)?;
        if config.reporting_endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "reporting_endpoint".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if config.reporting_api_version.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "reporting_api_version".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if config.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "request_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn check_max_chunk_size(value: u32) -> Result<(), ConfigError> {
        if !CHUNK_SIZE_RANGE.contains(&value) {
            return Err(ConfigError::ValidationFailed {
                field: "max_chunk_size".to_string(),
                message: format!(
                    "must be between {} and {}",
                    CHUNK_SIZE_RANGE.start(),
                    CHUNK_SIZE_RANGE.end()
                ),
            });
        }
        if !RECOMMENDED_CHUNK_SIZE_RANGE.contains(&value) {
            tracing::warn!(
                max_chunk_size = value,
                "max_chunk_size outside the recommended range {}..={}",
                RECOMMENDED_CHUNK_SIZE_RANGE.start(),
                RECOMMENDED_CHUNK_SIZE_RANGE.end()
            );
        }
        Ok(())
    }

    pub fn check_reporting_interval(value: u64) -> Result<(), ConfigError> {
        if !REPORTING_INTERVAL_RANGE.contains(&value) {
            return Err(ConfigError::ValidationFailed {
                field: "reporting_interval_ms".to_string(),
                message: format!(
                    "must be between {} and {} ms",
                    REPORTING_INTERVAL_RANGE.start(),
                    REPORTING_INTERVAL_RANGE.end()
                ),
            });
        }
        if !RECOMMENDED_REPORTING_INTERVAL_RANGE.contains(&value) {
            tracing::warn!(
                reporting_interval_ms = value,
                "reporting_interval_ms outside the recommended range {}..={}",
                RECOMMENDED_REPORTING_INTERVAL_RANGE.start(),
                RECOMMENDED_REPORTING_INTERVAL_RANGE.end()
            );
        }
        Ok(())
    }

    pub fn reporting_interval(&self) -> Duration {
        Duration::from_millis(self.reporting_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `{endpoint}/{apiVersion}/bucket/{bucket}/event`, or `None` without a bucket.
    pub fn event_url(&self) -> Option<String> {
        let bucket = self.bucket.as_deref().filter(|b| !b.is_empty())?;
        Some(format!(
            "{}/{}/bucket/{}/event",
            self.reporting_endpoint.trim_end_matches('/'),
            self.reporting_api_version.trim_matches('/'),
            bucket
        ))
    }

    /// Overlay a partial layer; only `Some` values apply.
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.enable {
            self.enable = v;
        }
        if let Some(v) = layer.debug {
            self.debug = v;
        }
        if layer.env.is_some() {
            self.env = layer.env;
        }
        if layer.bucket.is_some() {
            self.bucket = layer.bucket;
        }
        if layer.token.is_some() {
            self.token = layer.token;
        }
        if layer.cookie.is_some() {
            self.cookie = layer.cookie;
        }
        if let Some(v) = layer.max_chunk_size {
            self.max_chunk_size = v;
        }
        if let Some(v) = layer.reporting_interval_ms {
            self.reporting_interval_ms = v;
        }
        if let Some(v) = layer.reporting_endpoint {
            self.reporting_endpoint = v;
        }
        if let Some(v) = layer.reporting_api_version {
            self.reporting_api_version = v;
        }
        if let Some(v) = layer.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = layer.source {
            self.source = v;
        }
        if layer.user_agent.is_some() {
            self.user_agent = layer.user_agent;
        }
    }

    fn merge_toml_file(config: &mut ClientConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.merge(layer);
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `BITCLOCK_BUCKET`, `BITCLOCK_MAX_CHUNK_SIZE`, etc.
    /// Unparseable values are ignored. `BITCLOCK_TOKEN` is consulted by the
    /// token resolver, not copied into the config.
    fn apply_env_overrides(config: &mut ClientConfig) {
        if let Ok(val) = std::env::var("BITCLOCK_ENABLE") {
            if let Ok(v) = val.parse::<bool>() {
                config.enable = v;
            }
        }
        if let Ok(val) = std::env::var("BITCLOCK_DEBUG") {
            if let Ok(v) = val.parse::<bool>() {
                config.debug = v;
            }
        }
        if let Ok(val) = std::env::var(ENV_ENV_VAR) {
            config.env = Some(val);
        }
        if let Ok(val) = std::env::var("BITCLOCK_BUCKET") {
            config.bucket = Some(val);
        }
        if let Ok(val) = std::env::var("BITCLOCK_MAX_CHUNK_SIZE") {
            if let Ok(v) = val.parse::<u32>() {
                config.max_chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("BITCLOCK_REPORTING_INTERVAL_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.reporting_interval_ms = v;
            }
        }
        if let Ok(val) = std::env::var("BITCLOCK_REPORTING_ENDPOINT") {
            config.reporting_endpoint = val;
        }
        if let Ok(val) = std::env::var("BITCLOCK_REPORTING_API_VERSION") {
            config.reporting_api_version = val;
        }
    }
}
