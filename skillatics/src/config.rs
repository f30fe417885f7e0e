//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::api::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Default REST base URL (the backend mounts everything under `/api`)
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// REST API base URL, without trailing slash
    pub api_base_url: String,
    /// Directory holding the persisted session and log file
    pub state_dir: PathBuf,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
    /// TCP connect timeout
    pub connect_timeout_secs: u64,
    /// Backoff policy for idempotent reads
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            state_dir: default_state_dir(),
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `api_url_override` - Optional base URL override (from CLI args)
    /// * `state_dir_override` - Optional state directory override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ClientConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if the resulting base URL is empty
    pub fn from_env(
        api_url_override: Option<String>,
        state_dir_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let api_base_url = api_url_override
            .or_else(|| std::env::var("SKILLATICS_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        if api_base_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "SKILLATICS_API_URL".to_string(),
                hint: format!("Point it at the backend, e.g. {DEFAULT_API_URL}"),
            });
        }

        let state_dir = state_dir_override
            .or_else(|| std::env::var_os("SKILLATICS_STATE_DIR").map(PathBuf::from))
            .unwrap_or_else(default_state_dir);

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_env_or("SKILLATICS_RETRY_ATTEMPTS", defaults.max_attempts),
            base_delay: Duration::from_millis(parse_env_or(
                "SKILLATICS_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_env_or(
                "SKILLATICS_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
        };

        Ok(ClientConfig {
            api_base_url,
            state_dir,
            request_timeout_secs: parse_env_or("SKILLATICS_REQUEST_TIMEOUT_SECS", 15),
            connect_timeout_secs: parse_env_or("SKILLATICS_CONNECT_TIMEOUT_SECS", 5),
            retry,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid {
                var: "SKILLATICS_API_URL".to_string(),
                reason: format!("Must be an http(s) URL, got '{}'", self.api_base_url),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SKILLATICS_REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "SKILLATICS_RETRY_ATTEMPTS".to_string(),
                reason: "Must be at least 1 (1 disables retries)".to_string(),
            });
        }

        if self.retry.base_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid {
                var: "SKILLATICS_RETRY_BASE_DELAY_MS".to_string(),
                reason: format!(
                    "Must not exceed max delay ({}ms)",
                    self.retry.max_delay.as_millis()
                ),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Log file used while the terminal UI owns the screen
    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join("sk_client.log")
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_state_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".skillatics"),
        None => PathBuf::from(".skillatics"),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
