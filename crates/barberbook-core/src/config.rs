//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend base URL, the identity provider API key, the
//! credential store platform and the last e-mail used to sign in.
//!
//! Configuration is stored at `~/.config/barberbook/config.json`. Values from
//! the environment (`BARBERBOOK_*`) override what the file says.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "barberbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default backend address for local development.
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_URL: &str = "BARBERBOOK_API_URL";
pub const ENV_FIREBASE_API_KEY: &str = "BARBERBOOK_FIREBASE_API_KEY";
pub const ENV_PLATFORM: &str = "BARBERBOOK_PLATFORM";
pub const ENV_TIMEOUT_SECS: &str = "BARBERBOOK_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "BARBERBOOK_DATA_DIR";

/// Which credential store backs the session.
///
/// Chosen once at start-up; every read and write afterwards goes to the
/// same backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// OS keychain / secret service.
    #[default]
    Native,
    /// Plain key-value file, the analogue of browser local storage.
    Web,
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "ios" | "android" => Ok(Platform::Native),
            "web" => Ok(Platform::Web),
            other => Err(anyhow::anyhow!("Unknown platform: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub firebase_api_key: Option<String>,
    pub platform: Platform,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
    /// Replaces the platform cache directory for local storage and logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            firebase_api_key: None,
            platform: Platform::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_email: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from a variable lookup. Unparseable values are logged
    /// and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup(ENV_FIREBASE_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.firebase_api_key = Some(key.trim().to_string());
        }
        if let Some(platform) = lookup(ENV_PLATFORM) {
            match platform.parse() {
                Ok(p) => self.platform = p,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_PLATFORM),
            }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(s) if s > 0 => self.request_timeout_secs = s,
                _ => warn!(value = %secs, "Ignoring {}", ENV_TIMEOUT_SECS),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.platform, Platform::Native);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://api.example.com/api/"),
            (ENV_PLATFORM, "web"),
            (ENV_TIMEOUT_SECS, "0"),
            (ENV_DATA_DIR, "/srv/barberbook"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://api.example.com/api");
        assert_eq!(config.platform, Platform::Web);
        // zero is rejected
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.firebase_api_key.is_none());
        assert_eq!(
            config.cache_dir().unwrap(),
            PathBuf::from("/srv/barberbook")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"platform":"web"}"#)
            .expect("partial config should parse");
        assert_eq!(config.platform, Platform::Web);
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Native);
        assert_eq!(" web ".parse::<Platform>().unwrap(), Platform::Web);
        assert!("desktop".parse::<Platform>().is_err());
    }
}
