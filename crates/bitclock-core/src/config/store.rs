//! Shared read/write configuration store.
//!
//! One store is passed by reference into the scheduler, sender, token
//! resolver and every transaction. Mutations are validated per field: a
//! value outside its hard bounds is rejected and leaves the field
//! untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::Value;

use super::ClientConfig;
use crate::errors::ConfigError;
use crate::models::Source;
use crate::tracing::events;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<ClientConfig>>,
    /// Bumped whenever `token` or `cookie` changes, so memoized tokens
    /// can tell they are stale.
    token_revision: Arc<AtomicU64>,
}

impl ConfigStore {
    /// Create a store from a validated config.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        ClientConfig::validate(&config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
            token_revision: Arc::new(AtomicU64::new(0)),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, ClientConfig> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClientConfig> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A point-in-time copy of the whole config.
    pub fn snapshot(&self) -> ClientConfig {
        self.read().clone()
    }

    /// Read a value without cloning the whole config.
    pub fn with<R>(&self, f: impl FnOnce(&ClientConfig) -> R) -> R {
        f(&self.read())
    }

    pub fn enabled(&self) -> bool {
        self.read().enable
    }

    pub fn max_chunk_size(&self) -> usize {
        self.read().max_chunk_size as usize
    }

    pub fn reporting_interval(&self) -> Duration {
        self.read().reporting_interval()
    }

    pub fn token_revision(&self) -> u64 {
        self.token_revision.load(Ordering::Acquire)
    }

    fn bump_token_revision(&self) {
        self.token_revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn set_enable(&self, enable: bool) {
        self.write().enable = enable;
        events::config_changed("enable", &enable.to_string());
    }

    pub fn set_debug(&self, debug: bool) {
        self.write().debug = debug;
        events::config_changed("debug", &debug.to_string());
    }

    pub fn set_env(&self, env: Option<String>) {
        events::config_changed("env", env.as_deref().unwrap_or("<none>"));
        self.write().env = env;
    }

    pub fn set_bucket(&self, bucket: Option<String>) {
        events::config_changed("bucket", bucket.as_deref().unwrap_or("<none>"));
        self.write().bucket = bucket;
    }

    pub fn set_token(&self, token: Option<String>) {
        self.write().token = token;
        self.bump_token_revision();
        events::config_changed("token", "<redacted>");
    }

    pub fn set_cookie(&self, cookie: Option<String>) {
        self.write().cookie = cookie;
        self.bump_token_revision();
        events::config_changed("cookie", "<redacted>");
    }

    pub fn set_max_chunk_size(&self, value: u32) -> Result<(), ConfigError> {
        ClientConfig::check_max_chunk_size(value)?;
        self.write().max_chunk_size = value;
        events::config_changed("max_chunk_size", &value.to_string());
        Ok(())
    }

    pub fn set_reporting_interval_ms(&self, value: u64) -> Result<(), ConfigError> {
        ClientConfig::check_reporting_interval(value)?;
        self.write().reporting_interval_ms = value;
        events::config_changed("reporting_interval_ms", &value.to_string());
        Ok(())
    }

    pub fn set_reporting_endpoint(&self, endpoint: impl Into<String>) -> Result<(), ConfigError> {
        let endpoint = non_empty("reporting_endpoint", endpoint.into())?;
        events::config_changed("reporting_endpoint", &endpoint);
        self.write().reporting_endpoint = endpoint;
        Ok(())
    }

    pub fn set_reporting_api_version(&self, version: impl Into<String>) -> Result<(), ConfigError> {
        let version = non_empty("reporting_api_version", version.into())?;
        events::config_changed("reporting_api_version", &version);
        self.write().reporting_api_version = version;
        Ok(())
    }

    pub fn set_request_timeout_ms(&self, value: u64) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "request_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        self.write().request_timeout_ms = value;
        events::config_changed("request_timeout_ms", &value.to_string());
        Ok(())
    }

    pub fn set_source(&self, source: Source) {
        self.write().source = source;
        events::config_changed("source", source.as_str());
    }

    pub fn set_user_agent(&self, user_agent: Option<String>) {
        events::config_changed("user_agent", user_agent.as_deref().unwrap_or("<none>"));
        self.write().user_agent = user_agent;
    }

    /// Key/value mutation. Accepts snake_case or camelCase keys.
    ///
    /// Structurally wrong values (a string where an integer belongs, a
    /// fractional interval, ...) raise `InvalidValue`; in-type values
    /// outside the hard bounds raise `ValidationFailed`.
    pub fn set(&self, key: &str, value: Value) -> Result<(), ConfigError> {
        match key {
            "enable" => self.set_enable(expect_bool(key, &value)?),
            "debug" => self.set_debug(expect_bool(key, &value)?),
            "env" => self.set_env(expect_opt_string(key, value)?),
            "bucket" => self.set_bucket(expect_opt_string(key, value)?),
            "token" => self.set_token(expect_opt_string(key, value)?),
            "cookie" => self.set_cookie(expect_opt_string(key, value)?),
            "user_agent" | "userAgent" => self.set_user_agent(expect_opt_string(key, value)?),
            "max_chunk_size" | "maxChunkSize" => {
                let n = expect_integer(key, &value)?;
                let n = u32::try_from(n).map_err(|_| ConfigError::ValidationFailed {
                    field: key.to_string(),
                    message: "out of range".to_string(),
                })?;
                self.set_max_chunk_size(n)?;
            }
            "reporting_interval_ms" | "reportingInterval" => {
                self.set_reporting_interval_ms(expect_integer(key, &value)?)?;
            }
            "request_timeout_ms" | "requestTimeout" => {
                self.set_request_timeout_ms(expect_integer(key, &value)?)?;
            }
            "reporting_endpoint" | "reportingEndpoint" => {
                self.set_reporting_endpoint(expect_string(key, value)?)?;
            }
            "reporting_api_version" | "reportingAPIVersion" => {
                self.set_reporting_api_version(expect_string(key, value)?)?;
            }
            "source" => {
                let source = serde_json::from_value::<Source>(value).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: key.to_string(),
                        message: e.to_string(),
                    }
                })?;
                self.set_source(source);
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Replace the whole config after validating it.
    pub fn replace(&self, config: ClientConfig) -> Result<(), ConfigError> {
        ClientConfig::validate(&config)?;
        let mut guard = self.write();
        let token_changed = guard.token != config.token || guard.cookie != config.cookie;
        *guard = config;
        drop(guard);
        if token_changed {
            self.bump_token_revision();
        }
        events::config_changed("*", "replaced");
        Ok(())
    }

    /// Restore compiled defaults.
    pub fn reset(&self) {
        *self.write() = ClientConfig::default();
        self.bump_token_revision();
        events::config_changed("*", "reset");
    }
}

fn non_empty(field: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationFailed {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

fn invalid(field: &str, expected: &str, value: &Value) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("expected {expected}, got {value}"),
    }
}

fn expect_bool(field: &str, value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(field, "a bool", value))
}

fn expect_integer(field: &str, value: &Value) -> Result<u64, ConfigError> {
    value
        .as_u64()
        .ok_or_else(|| invalid(field, "a non-negative integer", value))
}

fn expect_string(field: &str, value: Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(invalid(field, "a string", &other)),
    }
}

fn expect_opt_string(field: &str, value: Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(invalid(field, "a string or null", &other)),
    }
}
