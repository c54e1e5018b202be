//! Client configuration: where the service lives and how long to wait.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

/// Timeout applied when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 0.2;

pub const ENV_BASE_URL: &str = "TROIA_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TROIA_TIMEOUT_SECS";

/// Base URL and timeout for a `TroiaClient`.
///
/// `base_url` always ends with exactly one `/` once it has gone through
/// `new` or `normalized`. `timeout` of `None` blocks indefinitely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_timeout_secs")]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout: default_timeout(),
        }
    }

    /// Set the timeout in seconds. Zero, negative, or non-finite means none.
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Reapply base URL normalization, e.g. after deserializing.
    pub fn normalized(mut self) -> Self {
        self.base_url = normalize_base_url(&self.base_url);
        self
    }

    /// Read `TROIA_BASE_URL` (required) and `TROIA_TIMEOUT_SECS` (optional).
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = env::var(ENV_BASE_URL)
            .map_err(|_| ApiError::InvalidConfig(format!("{ENV_BASE_URL} is not set")))?;
        let config = Self::new(&base_url);
        match env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => {
                let secs: f64 = raw.trim().parse().map_err(|_| {
                    ApiError::InvalidConfig(format!("{ENV_TIMEOUT_SECS}={raw:?} is not a number"))
                })?;
                Ok(config.with_timeout_secs(secs))
            }
            Err(_) => Ok(config),
        }
    }
}

/// Append a trailing `/` unless one is already there.
pub fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

/// Positive, finite seconds become a timeout. Anything else, including values
/// too large for a `Duration`, means no timeout.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn default_timeout() -> Option<Duration> {
    timeout_from_secs(DEFAULT_TIMEOUT_SECS)
}

fn deserialize_timeout_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.and_then(timeout_from_secs))
}
