//! Configuration management for clicktrail.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "clicktrail";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CLICKTRAIL_`, sections split by `__`)
/// 2. TOML config file at `~/.config/clicktrail/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracker configuration.
    pub tracker: TrackerConfig,
    /// Collection endpoint configuration.
    pub endpoints: EndpointConfig,
    /// Privacy configuration.
    pub privacy: PrivacyConfig,
    /// Which host events to capture.
    pub capture: CaptureConfig,
    /// Host defaults for non-browser embeddings.
    pub host: HostConfig,
}

/// Where recorded events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Write events to the local diagnostic log only.
    Development,
    /// POST events to the collection endpoints.
    #[default]
    Production,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Tracker-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Runtime mode.
    pub mode: Mode,
    /// Capacity of each ring buffer.
    pub max_events: usize,
    /// Default number of entries returned by the recent-event queries.
    pub recent_limit: usize,
}

/// Collection endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Origin of the collection service.
    pub base_url: String,
    /// Path receiving interaction events.
    pub interactions: String,
    /// Path receiving error events.
    pub errors: String,
    /// Request timeout in milliseconds. 0 uses the HTTP client default.
    pub timeout_ms: u64,
}

/// Privacy-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Form field names matching any of these patterns are redacted (regex).
    pub sensitive_field_patterns: Vec<String>,
    /// Replacement for redacted values.
    pub redaction_marker: String,
    /// Maximum characters kept from a submitted field value.
    pub max_value_length: usize,
    /// Maximum characters kept from clicked element text.
    pub max_text_length: usize,
}

/// Capture toggles, one per host event family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CaptureConfig {
    /// Record clicks.
    pub clicks: bool,
    /// Record input changes.
    pub inputs: bool,
    /// Record form submissions.
    pub submits: bool,
    /// Record focus and blur on form controls.
    pub focus: bool,
    /// Record navigation.
    pub navigation: bool,
    /// Record page loads.
    pub loads: bool,
    /// Record uncaught errors, rejections and resource failures.
    pub errors: bool,
    /// Record calls made through a tracked HTTP client.
    pub http: bool,
}

/// Host defaults used by [`crate::host::StaticHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Initial page.
    pub page: String,
    /// Reported user agent.
    pub user_agent: String,
    /// Reported viewport width.
    pub viewport_width: u32,
    /// Reported viewport height.
    pub viewport_height: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            max_events: 1000,
            recent_limit: 50,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            interactions: "/api/analytics/interactions".to_string(),
            errors: "/api/analytics/errors".to_string(),
            timeout_ms: 0,
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            sensitive_field_patterns: default_sensitive_field_patterns(),
            redaction_marker: "[REDACTED]".to_string(),
            max_value_length: 100,
            max_text_length: 50,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            clicks: true,
            inputs: true,
            submits: true,
            focus: true,
            navigation: true,
            loads: true,
            errors: true,
            http: true,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            page: "about:blank".to_string(),
            user_agent: format!("clicktrail/{}", env!("CARGO_PKG_VERSION")),
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// Default patterns for form fields that must never leave the host.
fn default_sensitive_field_patterns() -> Vec<String> {
    vec!["(?i)password".to_string(), "(?i)token".to_string()]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CLICKTRAIL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.tracker.max_events == 0 {
            return Err(Error::validation("max_events must be greater than 0"));
        }

        if self.privacy.max_value_length == 0 {
            return Err(Error::validation(
                "max_value_length must be greater than 0",
            ));
        }

        if self.endpoints.base_url.trim().is_empty() {
            return Err(Error::validation("base_url must not be empty"));
        }

        for (name, path) in [
            ("interactions", &self.endpoints.interactions),
            ("errors", &self.endpoints.errors),
        ] {
            if !path.starts_with('/') {
                return Err(Error::ConfigValidation {
                    message: format!("endpoint path for {name} must start with '/': {path}"),
                });
            }
        }

        for pattern in &self.privacy.sensitive_field_patterns {
            if regex::Regex::new(pattern).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("invalid regex pattern: {pattern}"),
                });
            }
        }

        Ok(())
    }

    /// Full URL receiving interaction events.
    #[must_use]
    pub fn interactions_url(&self) -> String {
        join_url(&self.endpoints.base_url, &self.endpoints.interactions)
    }

    /// Full URL receiving error events.
    #[must_use]
    pub fn errors_url(&self) -> String {
        join_url(&self.endpoints.base_url, &self.endpoints.errors)
    }

    /// Get the request timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        if self.endpoints.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.endpoints.timeout_ms))
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
