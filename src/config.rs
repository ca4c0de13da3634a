//! Configuration management for the Gemini CLI

use crate::error::{AppError, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key; takes precedence over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model to use for completions
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// System prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Request timeout in seconds; no timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            api_base: default_api_base(),
            api_version: default_api_version(),
            system_prompt: default_system_prompt(),
            timeout_seconds: None,
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment
    pub async fn load() -> Result<Self> {
        Self::load_from(None).await
    }

    /// Load configuration from `path` (or the default location) and environment
    pub async fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(path).await?;
        config.apply_env();
        Ok(config)
    }

    /// Load only what is stored in the config file, falling back to defaults
    pub async fn load_file(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        Self::read_file(&path).await
    }

    async fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|e| AppError::ConfigError(e.to_string()))
    }

    /// Override fields from `GEMINI_MODEL` and `GEMINI_API_BASE`
    pub fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.model = model;
        }

        if let Ok(api_base) = std::env::var("GEMINI_API_BASE") {
            self.api_base = api_base;
        }
    }

    /// Save configuration to the default config file
    pub async fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path).await?;
        Ok(path)
    }

    /// Save configuration to `path`
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::ConfigError(e.to_string()))?;

        tokio::fs::write(path, content).await?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let mut path = config_dir()
            .ok_or_else(|| AppError::ConfigError("Could not find config directory".to_string()))?;
        path.push("gemini-cli");
        path.push("config.toml");
        Ok(path)
    }

    /// Resolve the API key: explicit value first, then the environment
    pub fn api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(AppError::ApiKeyNotFound)
    }

    /// URL of the `generateContent` endpoint for the configured model
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.models_url(),
            self.model.trim_start_matches("models/")
        )
    }

    /// URL of the model listing endpoint
    pub fn models_url(&self) -> String {
        format!(
            "{}/{}/models",
            self.api_base.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// API key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        let key = self.api_key().ok()?;
        let chars: Vec<char> = key.chars().collect();
        let visible: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        Some(format!("****{visible}"))
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-preview-04-17".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_version() -> String {
    "v1beta".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Answer in a clear and concise manner.".to_string()
}
