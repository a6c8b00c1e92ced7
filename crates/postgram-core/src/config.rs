// SPDX-License-Identifier: Apache-2.0

//! Configuration management for postgram.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `POSTGRAM_`)
//! 2. Config file: `~/.config/postgram/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Supply credentials via environment variables
//! POSTGRAM_API__ACCESS_TOKEN=IGQVJ... POSTGRAM_API__USER_ID=17895695668004550 postgram post <url>
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

use crate::backoff::MAX_ATTEMPTS;
use crate::error::PostgramError;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Graph API settings.
    pub api: ApiConfig,
    /// Publish flow settings.
    pub publish: PublishConfig,
    /// Durable state settings.
    pub state: StateConfig,
}

/// Graph API settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Instagram access token. Usually supplied via
    /// `POSTGRAM_API__ACCESS_TOKEN` rather than the config file.
    pub access_token: String,
    /// Instagram business account id.
    pub user_id: String,
    /// Graph API version path segment.
    pub api_version: String,
    /// Base URL of the Graph API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Minimum interval between outbound requests in milliseconds.
    pub min_request_interval_ms: u64,
    /// Retry budget for rate-limited requests before the error surfaces.
    pub rate_limit_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            user_id: String::new(),
            api_version: "v23.0".to_string(),
            base_url: "https://graph.facebook.com".to_string(),
            timeout_seconds: 30,
            min_request_interval_ms: 1000,
            rate_limit_attempts: MAX_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    /// Returns the access token wrapped for redacted debug output.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::new(self.access_token.clone().into())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Minimum pacing interval as a [`Duration`].
    #[must_use]
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Publish flow settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Maximum container status polls before giving up.
    pub poll_max_attempts: u32,
    /// Base delay between status polls in seconds.
    pub poll_base_delay_secs: f64,
    /// Pending containers are abandoned once retried this many times.
    pub max_pending_retries: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            poll_max_attempts: 30,
            poll_base_delay_secs: 10.0,
            max_pending_retries: MAX_ATTEMPTS,
        }
    }
}

/// Durable state settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Path of the state file. Defaults to `<data dir>/api_state.json`.
    pub file: Option<PathBuf>,
}

impl StateConfig {
    /// Resolved state file path.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| data_dir().join("api_state.json"))
    }
}

/// Returns the postgram configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/postgram`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("postgram");
    }
    dirs::home_dir()
        .expect("Could not determine home directory - is HOME set?")
        .join(".config")
        .join("postgram")
}

/// Returns the postgram data directory.
///
/// Respects the `XDG_DATA_HOME` environment variable if set,
/// otherwise defaults to `~/.local/share/postgram`.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME")
        && !xdg_data.is_empty()
    {
        return PathBuf::from(xdg_data).join("postgram");
    }
    dirs::home_dir()
        .expect("Could not determine home directory - is HOME set?")
        .join(".local")
        .join("share")
        .join("postgram")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `POSTGRAM_` and double underscore
/// for nested keys (e.g., `POSTGRAM_API__USER_ID`).
///
/// # Errors
///
/// Returns `PostgramError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, PostgramError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("POSTGRAM")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        // Without any config file or env vars, should return defaults
        let config = load_config().expect("should load with defaults");

        assert_eq!(config.api.api_version, "v23.0");
        assert_eq!(config.api.base_url, "https://graph.facebook.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.api.min_request_interval_ms, 1000);
        assert_eq!(config.api.rate_limit_attempts, 5);
        assert_eq!(config.publish.poll_max_attempts, 30);
        assert!((config.publish.poll_base_delay_secs - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.publish.max_pending_retries, 5);
        assert!(config.state.file.is_none());
    }

    #[test]
    fn test_config_dir_exists() {
        let dir = config_dir();
        assert!(dir.ends_with("postgram"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_state_file_path_defaults_to_data_dir() {
        let state = StateConfig::default();
        let path = state.file_path();
        assert!(path.ends_with("api_state.json"));
    }

    #[test]
    fn test_state_file_path_override() {
        let state = StateConfig {
            file: Some(PathBuf::from("/tmp/custom_state.json")),
        };
        assert_eq!(state.file_path(), PathBuf::from("/tmp/custom_state.json"));
    }

    #[test]
    fn test_config_from_toml() {
        let config_str = r#"
[api]
access_token = "IGQVJtest"
user_id = "17895695668004550"
timeout_seconds = 45

[publish]
poll_max_attempts = 10

[state]
file = "/var/lib/postgram/state.json"
"#;

        let config = Config::builder()
            .add_source(config::File::from_str(config_str, config::FileFormat::Toml))
            .build()
            .expect("should build config");

        let app_config: AppConfig = config.try_deserialize().expect("should deserialize");

        assert_eq!(app_config.api.access_token, "IGQVJtest");
        assert_eq!(app_config.api.user_id, "17895695668004550");
        assert_eq!(app_config.api.timeout_seconds, 45);
        // Unset keys fall back to defaults
        assert_eq!(app_config.api.api_version, "v23.0");
        assert_eq!(app_config.publish.poll_max_attempts, 10);
        assert_eq!(app_config.publish.max_pending_retries, 5);
        assert_eq!(
            app_config.state.file,
            Some(PathBuf::from("/var/lib/postgram/state.json"))
        );
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let api = ApiConfig {
            access_token: "IGQVJsecret".to_string(),
            ..ApiConfig::default()
        };
        let debug = format!("{:?}", api.token());
        assert!(!debug.contains("IGQVJsecret"));
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_config_home() {
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/custom/config");
        }

        let dir = config_dir();
        assert_eq!(dir, PathBuf::from("/custom/config/postgram"));

        // Cleanup
        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_data_dir_respects_xdg_data_home() {
        let original = std::env::var("XDG_DATA_HOME").ok();
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "/custom/data");
        }

        let dir = data_dir();
        assert_eq!(dir, PathBuf::from("/custom/data/postgram"));

        // Cleanup
        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_DATA_HOME", val),
                None => std::env::remove_var("XDG_DATA_HOME"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_data_dir_ignores_empty_xdg_data_home() {
        let original = std::env::var("XDG_DATA_HOME").ok();
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "");
        }

        let dir = data_dir();
        assert!(dir.ends_with("postgram"));

        // Cleanup
        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_DATA_HOME", val),
                None => std::env::remove_var("XDG_DATA_HOME"),
            }
        }
    }
}
