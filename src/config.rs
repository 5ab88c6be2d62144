//! Configuration Management
//!
//! Handles persistent configuration storage for the redmine CLI.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no URL is configured
pub const URL_ENV: &str = "REDMINE_URL";
/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "REDMINE_API_KEY";

const DEFAULT_URL: &str = "http://localhost:3000";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Redmine server URL
    #[serde(default)]
    pub url: Option<String>,
    /// API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,
    /// Records requested per page when listing
    #[serde(default)]
    pub page_size: Option<u64>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("redmine-client").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective server URL (config > environment > localhost)
    pub fn effective_url(&self) -> String {
        self.url
            .clone()
            .or_else(|| std::env::var(URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    /// Get effective API key (config > environment)
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }

    pub fn effective_page_size(&self) -> u64 {
        self.page_size.unwrap_or(redmine_client::resource::DEFAULT_PAGE_SIZE)
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(redmine_client::redmine::client::DEFAULT_TIMEOUT)
    }

    /// Set server URL and save
    pub fn set_url(&mut self, url: &str) -> Result<()> {
        self.url = Some(url.to_string());
        self.save()
    }

    /// Set API key and save
    pub fn set_api_key(&mut self, api_key: &str) -> Result<()> {
        self.api_key = Some(api_key.to_string());
        self.save()
    }
}
