//! Configuration management for workshop-sync
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    CONFIG_GENERATED, DEFAULT_SYNC_INTERVAL_SECONDS, DEFAULT_TIMEOUT_SECONDS, DEFAULT_TOKEN_ENV,
    MAX_SYNC_INTERVAL_SECONDS,
};
use crate::utils::datetime;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Moodle site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the Moodle site, e.g. "https://school.example.org"
    pub url: String,
    /// Environment variable holding the web-service token
    pub token_env: String,
    /// HTTP timeout for web-service calls
    pub timeout_seconds: u64,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum seconds between automatic syncs of the same workshop
    pub sync_interval_seconds: u64,
    /// Queue mutations locally when the site can't be reached
    pub allow_offline: bool,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file (defaults to the XDG data dir)
    pub database_path: Option<PathBuf>,
    /// Folder for attachments of queued actions (defaults to the XDG data dir)
    pub files_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging to file
    pub enabled: bool,
    /// Minimum level: "error", "warn", "info", "debug" or "trace"
    pub level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "https://moodle.example.org".to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_seconds: DEFAULT_SYNC_INTERVAL_SECONDS,
            allow_offline: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Read the web-service token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|token| !token.is_empty())
    }
}

impl LoggingConfig {
    /// Parsed level filter
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("workshop-sync.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("workshop-sync").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let url = self.site.url.trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("site.url must start with http:// or https://, got '{}'", self.site.url);
        }

        if self.site.token_env.is_empty() {
            anyhow::bail!("site.token_env cannot be empty");
        }

        if self.site.timeout_seconds == 0 || self.site.timeout_seconds > 300 {
            anyhow::bail!(
                "site.timeout_seconds must be between 1 and 300, got {}",
                self.site.timeout_seconds
            );
        }

        if self.sync.sync_interval_seconds > MAX_SYNC_INTERVAL_SECONDS {
            anyhow::bail!(
                "sync_interval_seconds cannot exceed {} (24 hours)",
                MAX_SYNC_INTERVAL_SECONDS
            );
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Database file, either configured or under the XDG data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::get_data_dir()?.join("offline.sqlite")),
        }
    }

    /// Attachment folder, either configured or under the XDG data directory
    pub fn files_dir(&self) -> Result<PathBuf> {
        match &self.storage.files_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::get_data_dir()?.join("files")),
        }
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# workshop-sync Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format(datetime::DISPLAY_DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("workshop-sync"))
    }

    /// Get the XDG data directory path
    pub fn get_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join("workshop-sync"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
