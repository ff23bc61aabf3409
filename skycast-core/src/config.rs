use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::error::Error;

/// Service names accepted by `configure` and used as config table keys.
pub const OPENWEATHER: &str = "openweather";
pub const WEATHERAPI: &str = "weatherapi";
pub const WEATHERBIT: &str = "weatherbit";
pub const ACCUWEATHER: &str = "accuweather";
pub const UNSPLASH: &str = "unsplash";

const KNOWN_SERVICES: &[&str] = &[OPENWEATHER, WEATHERAPI, WEATHERBIT, ACCUWEATHER, UNSPLASH];

/// Credentials for a single backing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [services.openweather]
/// api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub services: HashMap<String, ServiceConfig>,
}

impl Config {
    /// Service names a key can be stored for.
    pub const fn known_services() -> &'static [&'static str] {
        KNOWN_SERVICES
    }

    pub fn is_known_service(service: &str) -> bool {
        KNOWN_SERVICES.contains(&service)
    }

    /// Environment variable that overrides the stored key for a service,
    /// e.g. `SKYCAST_OPENWEATHER_API_KEY`.
    pub fn env_var_name(service: &str) -> String {
        format!("SKYCAST_{}_API_KEY", service.to_uppercase())
    }

    /// API key for a service: environment override first, then config file.
    pub fn api_key(&self, service: &str) -> Option<String> {
        if let Ok(value) = std::env::var(Self::env_var_name(service)) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        self.services.get(service).map(|cfg| cfg.api_key.clone())
    }

    /// API key for a service that the caller cannot work without.
    pub fn require_api_key(&self, service: &str) -> std::result::Result<String, Error> {
        self.api_key(service).ok_or_else(|| Error::missing_credential(service))
    }

    pub fn is_configured(&self, service: &str) -> bool {
        self.api_key(service).is_some()
    }

    /// Set or replace the stored API key for a service.
    pub fn upsert_api_key(&mut self, service: &str, api_key: String) {
        self.services.insert(service.to_string(), ServiceConfig { api_key });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
