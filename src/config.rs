/// Application configuration
///
/// Loaded once at startup from `<config dir>/nature-id/config.toml`.
/// Every field has a default, so a missing file is not an error.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Which remote service performs the identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Google Generative Language API (`generateContent`)
    #[default]
    Gemini,
    /// Any HTTP endpoint taking `{"photoDataUri"}` and returning the result JSON
    Flow,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub backend: Backend,
    pub model: String,
    /// Flow endpoint, or a base-URL override for Gemini
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Gemini,
            model: "gemini-2.0-flash".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Preferred camera direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera, pointing away from the user
    #[default]
    Environment,
    User,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device display name to use instead of auto-selection
    pub device: Option<String>,
    pub facing: Facing,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub identifier: IdentifierConfig,
    pub camera: CameraConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::get_config_path();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            log::info!("📁 Loaded config from {}", path.display());
            Self::from_toml(&contents)?
        } else {
            log::info!("📁 No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Get the path where the config file is expected
    /// - Linux: ~/.config/nature-id/config.toml
    /// - macOS: ~/Library/Application Support/nature-id/config.toml
    /// - Windows: %APPDATA%\nature-id\config.toml
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_default();

        path.push("nature-id");
        path.push("config.toml");
        path
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Environment variables override the file
    ///
    /// API key lookup order: NATUREID_API_KEY, GEMINI_API_KEY, GOOGLE_API_KEY.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key = ["NATUREID_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .into_iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
        if let Some(key) = key {
            self.identifier.api_key = Some(key);
        }

        if let Some(endpoint) = lookup("NATUREID_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.identifier.endpoint = Some(endpoint);
        }
    }
}
