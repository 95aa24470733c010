//! Configuration management module.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "PORTAL_API_URL";

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL from the environment for this run only; never written to disk.
    #[serde(skip)]
    pub env_base_url: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// UI preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long a toast stays on screen (default: 3000ms).
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
    #[serde(default)]
    pub dark_mode: bool,
}

fn default_toast_duration_ms() -> u64 {
    3000
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Keep the token on disk between runs.
    pub remember_login: bool,
}

impl AppConfig {
    /// Get config file path (same directory as executable).
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Per-user data directory for the session file and logs.
    pub fn data_dir() -> PathBuf {
        ProjectDirs::from("org", "HealthcarePortal", "healthcare-portal")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".portal"))
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(mut config) => {
                    config.apply_env_override(std::env::var(API_URL_ENV).ok());
                    match config.validate() {
                        Ok(()) => ConfigLoadResult::Loaded(config),
                        Err(e) => ConfigLoadResult::Invalid(e),
                    }
                }
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Use the environment's base URL for this run, leaving the saved one alone.
    pub fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            let url = url.trim().to_string();
            if !is_http_url(&url) {
                tracing::warn!("Ignoring {}: {} is not an http(s) URL", API_URL_ENV, url);
                return;
            }
            tracing::info!("Using API base URL from {}: {}", API_URL_ENV, url);
            self.api.env_base_url = Some(url);
        }
    }

    /// Restore defaults, keeping any environment override for this run.
    pub fn reset_to_defaults(&mut self) {
        let env_base_url = self.api.env_base_url.take();
        *self = Self::default();
        self.api.env_base_url = env_base_url;
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation("API base URL cannot be empty".to_string()));
        }
        if !is_http_url(url) {
            return Err(ConfigError::Validation(
                "API base URL must start with http:// or https://".to_string(),
            ));
        }
        if self.api.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.ui.toast_duration_ms < 500 {
            return Err(ConfigError::Validation(
                "Toast duration must be at least 500ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl ApiConfig {
    /// Saved base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }

    /// The URL requests go to: the environment override if set, else the saved one.
    pub fn effective_base_url(&self) -> String {
        match &self.env_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.normalized_base_url(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: default_timeout_secs(),
            env_base_url: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
            dark_mode: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { remember_login: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalized_base_url() {
        let api = ApiConfig {
            base_url: " https://portal.example.org/api/ ".to_string(),
            timeout_secs: 10,
            env_base_url: None,
        };
        assert_eq!(api.normalized_base_url(), "https://portal.example.org/api");
    }

    #[test]
    fn test_validation_empty_url() {
        let mut config = AppConfig::default();
        config.api.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let mut config = AppConfig::default();
        config.api.base_url = "ftp://invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_toast_duration() {
        let mut config = AppConfig::default();
        config.ui.toast_duration_ms = 100;
        assert!(config.validate().is_err());

        config.ui.toast_duration_ms = 3000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        config.apply_env_override(Some("https://backend.local/api/".to_string()));
        assert_eq!(config.api.effective_base_url(), "https://backend.local/api");
        assert_eq!(config.api.base_url, "http://localhost:8080/api");

        config.apply_env_override(Some("   ".to_string()));
        config.apply_env_override(Some("backend.local".to_string()));
        config.apply_env_override(None);
        assert_eq!(config.api.effective_base_url(), "https://backend.local/api");
    }

    #[test]
    fn test_env_override_not_saved() {
        let dir = std::env::temp_dir().join(format!("portal_env_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = AppConfig::default();
        config.apply_env_override(Some("https://staging.example.org/api".to_string()));
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("staging.example.org"));
        let reloaded: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.api.base_url, "http://localhost:8080/api");
        assert!(reloaded.api.env_base_url.is_none());

        config.reset_to_defaults();
        assert_eq!(config.api.effective_base_url(), "https://staging.example.org/api");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("[api]\nbase_url = \"http://localhost:9000\"\n").unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.ui.toast_duration_ms, 3000);
        assert!(config.session.remember_login);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("portal_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = AppConfig::default();
        config.api.base_url = "http://127.0.0.1:8080/api".to_string();
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => {
                if std::env::var(API_URL_ENV).is_err() {
                    assert_eq!(loaded.api.base_url, "http://127.0.0.1:8080/api");
                }
            }
            other => panic!("unexpected load result: {other:?}"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("portal_definitely_missing_config.toml");
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));
    }
}
