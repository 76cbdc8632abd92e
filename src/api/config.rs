//! Client configuration loaded from environment variables with optional
//! overrides from the command line. Values are public; do not store secrets
//! here.

use super::errors::AppError;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub const ENV_API_BASE_URL: &str = "EQ_API_BASE_URL";
pub const ENV_DATA_DIR: &str = "EQ_DATA_DIR";
pub const ENV_REQUEST_TIMEOUT: &str = "EQ_REQUEST_TIMEOUT";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Default request deadline (seconds) applied to every HTTP call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Values that replace the environment-derived defaults when present.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub data_dir: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads config from the environment, falling back to local defaults.
    #[must_use]
    pub fn load() -> Self {
        let api_base_url = read_env(ENV_API_BASE_URL)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let data_dir = read_env(ENV_DATA_DIR).map_or_else(default_data_dir, PathBuf::from);
        let request_timeout_secs = read_env(ENV_REQUEST_TIMEOUT)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_base_url,
            data_dir,
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }

    /// Loads config from the environment and applies the provided overrides.
    #[must_use]
    pub fn load_with(overrides: ConfigOverrides) -> Self {
        let mut config = Self::load();
        apply_overrides(&mut config, overrides);
        config
    }

    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the URL does not parse or uses another scheme.
    pub fn validate(&self) -> Result<(), AppError> {
        let url = Url::parse(&self.api_base_url).map_err(|err| {
            AppError::Config(format!("Invalid API base URL {}: {err}", self.api_base_url))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::Config(format!(
                "Unsupported API base URL scheme: {scheme}"
            ))),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: ConfigOverrides) {
    if let Some(value) = overrides.api_base_url.as_deref().and_then(normalize_value) {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.data_dir.as_deref().and_then(normalize_value) {
        config.data_dir = PathBuf::from(value);
    }
    if let Some(secs) = overrides.request_timeout_secs.filter(|secs| *secs > 0) {
        config.request_timeout = Duration::from_secs(secs);
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().as_deref().and_then(normalize_value)
}

fn default_data_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || PathBuf::from(".eq-portal"),
        |home| PathBuf::from(home).join(".eq-portal"),
    )
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
