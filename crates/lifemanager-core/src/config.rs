//! Application configuration management.
//!
//! This module handles loading and saving the client configuration:
//! the backend base address override, the token storage medium, the
//! request timeout and the last username used to log in.
//!
//! Configuration is stored at `~/.config/lifemanager/config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "lifemanager";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Android emulators reach the host machine through this alias.
const ANDROID_EMULATOR_API_URL: &str = "http://10.0.2.2:3000";

const LOCAL_API_URL: &str = "http://localhost:3000";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Secure store when reachable, token file otherwise
    #[default]
    Auto,
    #[serde(alias = "keyring")]
    Secure,
    File,
    Memory,
}

impl FromStr for StorageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(StorageMode::Auto),
            "secure" | "keyring" => Ok(StorageMode::Secure),
            "file" => Ok(StorageMode::File),
            "memory" => Ok(StorageMode::Memory),
            other => Err(anyhow::anyhow!("Unknown token storage mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the platform default backend address
    #[serde(alias = "apiUrl")]
    pub api_url: Option<String>,
    pub token_storage: StorageMode,
    pub request_timeout_secs: u64,
    /// Prefilled at the next login prompt. Passwords are never saved.
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            token_storage: StorageMode::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
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

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend base address: the configured override, else the platform default.
    pub fn api_base_url(&self) -> String {
        match self.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => default_api_url().to_string(),
        }
    }

    /// Per-request timeout. Zero would fail every call, so it means the default.
    pub fn request_timeout(&self) -> std::time::Duration {
        let secs = match self.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT_SECS,
            secs => secs,
        };
        std::time::Duration::from_secs(secs)
    }
}

pub fn default_api_url() -> &'static str {
    if cfg!(target_os = "android") {
        ANDROID_EMULATOR_API_URL
    } else {
        LOCAL_API_URL
    }
}
